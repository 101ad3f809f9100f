//! Stock lookup for the demo catalog.

use async_trait::async_trait;
use agentloom_core::error::ToolError;
use agentloom_core::tool::{ParamType, Tool, ToolParameter};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::required_str;

/// Fixed restock date reported for anything with incoming units.
const RESTOCK_DATE: &str = "2025-12-20";

#[derive(Debug, Clone, Copy)]
struct StockLevel {
    product_id: &'static str,
    available: u32,
    reserved: u32,
    incoming: u32,
}

const STOCK: &[StockLevel] = &[
    StockLevel { product_id: "prod-001", available: 15, reserved: 3, incoming: 20 },
    StockLevel { product_id: "prod-002", available: 45, reserved: 5, incoming: 0 },
    StockLevel { product_id: "prod-003", available: 23, reserved: 2, incoming: 15 },
    StockLevel { product_id: "prod-004", available: 8, reserved: 1, incoming: 10 },
    StockLevel { product_id: "prod-005", available: 12, reserved: 0, incoming: 5 },
    StockLevel { product_id: "prod-006", available: 30, reserved: 8, incoming: 25 },
    StockLevel { product_id: "prod-007", available: 25, reserved: 4, incoming: 0 },
    StockLevel { product_id: "prod-008", available: 50, reserved: 10, incoming: 30 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn from_available(available: u32) -> Self {
        match available {
            0 => StockStatus::OutOfStock,
            1..=10 => StockStatus::LowStock,
            _ => StockStatus::InStock,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StockReport {
    product_id: &'static str,
    available: u32,
    reserved: u32,
    incoming: u32,
    status: StockStatus,
    estimated_restock_date: Option<&'static str>,
}

pub struct CheckStockTool;

#[async_trait]
impl Tool for CheckStockTool {
    fn name(&self) -> &str {
        "check_stock"
    }

    fn description(&self) -> &str {
        "Verifica estoque de um produto ESPECÍFICO. Use quando o cliente perguntar \"tem X unidades?\", \"quando chega?\". IMPORTANTE: Você precisa ter o productId (exemplo: prod-001). Se não tiver, use search_products PRIMEIRO."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "productId",
            ParamType::String,
            "ID do produto (exemplo: \"prod-001\", \"prod-002\"). Obtenha com search_products antes.",
        )]
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let product_id = required_str(&arguments, "productId")?;

        let Some(level) = STOCK.iter().find(|s| s.product_id == product_id) else {
            // Reported to the model as data so it can ask for a valid id.
            return Ok(serde_json::json!({
                "error": "Product not found",
                "productId": product_id,
            }));
        };

        let report = StockReport {
            product_id: level.product_id,
            available: level.available,
            reserved: level.reserved,
            incoming: level.incoming,
            status: StockStatus::from_available(level.available),
            estimated_restock_date: (level.incoming > 0).then_some(RESTOCK_DATE),
        };
        serde_json::to_value(report).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })
    }
}
