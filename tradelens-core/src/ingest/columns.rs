//! Column layout of a ledger file.
//!
//! Mandatory columns are fixed. Optional columns (size, slippage pair,
//! process-control flags) are named by a [`ColumnConfig`] and resolved once
//! against the header row into a [`ResolvedColumns`].

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const ID: &str = "id_operacion";
pub const ENTRY_TIME: &str = "fecha_entrada";
pub const EXIT_TIME: &str = "fecha_salida";
pub const INSTRUMENT: &str = "activo";
pub const SIDE: &str = "lado";
pub const ENTRY_PRICE: &str = "precio_entrada";
pub const EXIT_PRICE: &str = "precio_salida";
pub const PROBABILITY: &str = "probabilidad_asignada";

/// Columns every ledger must carry, in reporting order.
pub const MANDATORY_COLUMNS: [&str; 8] = [
    ID,
    ENTRY_TIME,
    EXIT_TIME,
    INSTRUMENT,
    SIDE,
    ENTRY_PRICE,
    EXIT_PRICE,
    PROBABILITY,
];

/// Names of the optional columns the ingester recognizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub size: String,
    pub estimated_slippage: String,
    pub actual_slippage: String,
    /// Boolean process-control columns, in reporting order.
    pub controls: Vec<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            size: "tamanio".into(),
            estimated_slippage: "slippage_estimado_pct".into(),
            actual_slippage: "slippage_real_pct".into(),
            controls: vec![
                "regla_riesgo_ok".into(),
                "regla_salida_ok".into(),
                "tesis_documentada".into(),
                "proceso_seguido".into(),
            ],
        }
    }
}

/// Header positions of every column the ingester reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub id: usize,
    pub entry_time: usize,
    pub exit_time: usize,
    pub instrument: usize,
    pub side: usize,
    pub entry_price: usize,
    pub exit_price: usize,
    pub probability: usize,
    pub size: Option<usize>,
    pub estimated_slippage: Option<usize>,
    pub actual_slippage: Option<usize>,
    /// Present control columns, in `ColumnConfig::controls` order.
    pub controls: Vec<(String, usize)>,
}

impl ResolvedColumns {
    /// Match the header row against the mandatory set and the configured
    /// optional names.
    ///
    /// Fails with every missing mandatory column, not just the first.
    pub fn resolve(headers: &StringRecord, config: &ColumnConfig) -> Result<Self, ValidationError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = MANDATORY_COLUMNS
            .iter()
            .filter(|name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        // Every mandatory name was found above.
        let required = |name: &str| find(name).unwrap_or_default();

        let mut controls: Vec<(String, usize)> = Vec::new();
        for name in &config.controls {
            if controls.iter().any(|(seen, _)| seen == name) {
                continue;
            }
            if let Some(idx) = find(name) {
                controls.push((name.clone(), idx));
            }
        }

        Ok(Self {
            id: required(ID),
            entry_time: required(ENTRY_TIME),
            exit_time: required(EXIT_TIME),
            instrument: required(INSTRUMENT),
            side: required(SIDE),
            entry_price: required(ENTRY_PRICE),
            exit_price: required(EXIT_PRICE),
            probability: required(PROBABILITY),
            size: find(&config.size),
            estimated_slippage: find(&config.estimated_slippage),
            actual_slippage: find(&config.actual_slippage),
            controls,
        })
    }

    pub fn control_names(&self) -> Vec<String> {
        self.controls.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Both slippage columns are present.
    pub fn has_slippage(&self) -> bool {
        self.estimated_slippage.is_some() && self.actual_slippage.is_some()
    }
}
