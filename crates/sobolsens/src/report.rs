//! Human-readable and JSON renderings of estimation results.

use serde::Serialize;
use sobolsens_core::{IndexSet, SensitivityResult};

/// One estimate together with the index set it was computed for
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub index_set: IndexSet,
    #[serde(flatten)]
    pub result: SensitivityResult,
    pub first_order: Option<f64>,
    pub total_order: Option<f64>,
}

impl EstimateReport {
    pub fn new(index_set: IndexSet, result: SensitivityResult) -> Self {
        Self {
            first_order: result.first_order(),
            total_order: result.total_order(),
            index_set,
            result,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let indices: Vec<String> = self.index_set.iter().map(|i| i.to_string()).collect();
        let ratio = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.6}"));
        let r = &self.result;
        format!(
            "index set      {{{}}}\n\
             samples        {}\n\
             model mean     {:.6}\n\
             model variance {:.6}\n\
             lower index    {:.6}\n\
             total index    {:.6}\n\
             first order    {}\n\
             total order    {}\n",
            indices.join(", "),
            r.samples,
            r.model_mean,
            r.model_variance,
            r.lower_index,
            r.total_index,
            ratio(self.first_order),
            ratio(self.total_order),
        )
    }
}
