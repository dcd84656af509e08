//! Shared types: receipt records, wire payloads, ID aliases.

pub mod boleta;
pub mod ids;

pub use boleta::{
    page_offset, Boleta, BoletaListResponse, BoletaOut, BoletaStats, CreateBoletaRequest,
    NewBoleta, OcrFromStorageRequest, OcrResponse,
};
pub use ids::{BoletaId, UserId};
