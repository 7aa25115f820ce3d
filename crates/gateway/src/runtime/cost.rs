//! Per-exchange token and dollar estimate.
//!
//! Tokens are approximated by character counts.  Input tokens are the
//! characters of every outgoing turn; output tokens are half of input plus
//! reply characters, rounded down.

use serde::Serialize;

use cg_domain::config::ModelPricing;
use cg_providers::GenerateContentRequest;

/// Estimated usage of a single exchange.  Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEstimate {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost_usd: f64,
    pub output_cost_usd: f64,
}

impl CostEstimate {
    pub fn total_usd(&self) -> f64 {
        self.input_cost_usd + self.output_cost_usd
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CostEstimator {
    pricing: ModelPricing,
}

impl CostEstimator {
    pub fn new(pricing: ModelPricing) -> Self {
        Self { pricing }
    }

    /// Estimate the cost of sending `request` and receiving `response_text`.
    pub fn estimate(&self, request: &GenerateContentRequest, response_text: &str) -> CostEstimate {
        let input_chars = request.char_count() as u64;
        let output_chars = response_text.chars().count() as u64;

        let input_tokens = input_chars;
        let output_tokens = (input_chars + output_chars) / 2;

        CostEstimate {
            input_tokens,
            output_tokens,
            input_cost_usd: self.pricing.input_cost(input_tokens),
            output_cost_usd: self.pricing.output_cost(output_tokens),
        }
    }
}
