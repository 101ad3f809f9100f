//! Product search over a fixed demo catalog.

use async_trait::async_trait;
use agentloom_core::error::ToolError;
use agentloom_core::tool::{ParamType, Tool, ToolParameter};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::required_str;

const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub price: f64,
    pub stock: u32,
    pub description: &'static str,
}

pub const CATALOG: &[Product] = &[
    Product {
        id: "prod-001",
        name: "Notebook Dell Inspiron",
        category: "Eletrônicos",
        price: 3499.99,
        stock: 15,
        description: "Notebook com Intel i5, 8GB RAM, 256GB SSD",
    },
    Product {
        id: "prod-002",
        name: "Mouse Logitech MX Master",
        category: "Periféricos",
        price: 349.99,
        stock: 45,
        description: "Mouse ergonômico sem fio",
    },
    Product {
        id: "prod-003",
        name: "Teclado Mecânico Keychron",
        category: "Periféricos",
        price: 599.99,
        stock: 23,
        description: "Teclado mecânico RGB hot-swappable",
    },
    Product {
        id: "prod-004",
        name: "Monitor LG UltraWide 34\"",
        category: "Eletrônicos",
        price: 2199.99,
        stock: 8,
        description: "Monitor ultrawide 21:9, 3440x1440",
    },
    Product {
        id: "prod-005",
        name: "Cadeira Gamer DXRacer",
        category: "Móveis",
        price: 1499.99,
        stock: 12,
        description: "Cadeira ergonômica para escritório e gaming",
    },
    Product {
        id: "prod-006",
        name: "Webcam Logitech C920",
        category: "Periféricos",
        price: 449.99,
        stock: 30,
        description: "Webcam Full HD 1080p",
    },
    Product {
        id: "prod-007",
        name: "Headset HyperX Cloud",
        category: "Áudio",
        price: 399.99,
        stock: 25,
        description: "Headset gamer com microfone removível",
    },
    Product {
        id: "prod-008",
        name: "SSD Samsung 1TB",
        category: "Armazenamento",
        price: 549.99,
        stock: 50,
        description: "SSD NVMe M.2 de alta performance",
    },
];

pub struct SearchProductsTool;

#[async_trait]
impl Tool for SearchProductsTool {
    fn name(&self) -> &str {
        "search_products"
    }

    fn description(&self) -> &str {
        "Busca produtos no catálogo. Use quando o cliente perguntar \"tem notebook?\", \"qual o preço do mouse?\", \"produtos de eletrônicos?\". Exemplo: query=\"notebook\" retorna lista de notebooks disponíveis."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required(
                "query",
                ParamType::String,
                "Palavra-chave para buscar. Exemplos: \"notebook\", \"mouse\", \"eletrônicos\", \"teclado\"",
            ),
            ToolParameter::optional(
                "maxResults",
                ParamType::Number,
                "Quantos produtos mostrar (padrão: 10)",
            )
            .with_default(DEFAULT_MAX_RESULTS),
        ]
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let query = required_str(&arguments, "query")?;
        let max_results = max_results(arguments.get("maxResults"))?;

        let matches = search(query);
        let total = matches.len();
        let results: Vec<&Product> = matches.into_iter().take(max_results).collect();

        Ok(serde_json::json!({
            "query": query,
            "totalResults": total,
            "results": results,
        }))
    }
}

/// Case-insensitive substring match on name, category and description.
pub fn search(query: &str) -> Vec<&'static Product> {
    let needle = query.to_lowercase();
    CATALOG
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Models sometimes send numbers as strings; accept both.
fn max_results(raw: Option<&Value>) -> Result<usize, ToolError> {
    let n = match raw {
        None | Some(Value::Null) => return Ok(DEFAULT_MAX_RESULTS),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match n {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n as usize),
        _ => Err(ToolError::InvalidArguments(
            "'maxResults' must be a non-negative number".into(),
        )),
    }
}
