// Mint a development access token accepted by the API.
// Usage: cargo run --bin issue_token -- <user_id> [--email a@b.cl] [--ttl 3600]

use clap::Parser;
use std::env;

use gastoagil_api::middleware::issue_token;

#[derive(Parser)]
#[command(about = "Issue an HS256 access token signed with SUPABASE_JWT_SECRET")]
struct Args {
    /// Subject (user id) to embed in the token
    user_id: String,
    #[arg(long)]
    email: Option<String>,
    /// Lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    ttl: i64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenv::dotenv().ok();
    let secret = env::var("SUPABASE_JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("SUPABASE_JWT_SECRET environment variable is not set"))?;

    if args.ttl <= 0 {
        anyhow::bail!("--ttl must be positive");
    }

    let token = issue_token(&args.user_id, args.email.as_deref(), &secret, args.ttl)?;
    println!("{}", token);
    Ok(())
}
