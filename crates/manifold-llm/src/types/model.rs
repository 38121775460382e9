use serde::{Deserialize, Serialize};

/// Bare model catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier
    pub id: String,
    /// Object type (always "model")
    pub object: String,
    /// Unix timestamp the model was published
    pub created: u64,
    /// Owning organization tag
    pub owned_by: String,
}

/// Capability flags attached to an enriched model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Model accepts image input
    pub vision: bool,
    /// Model supports tool/function calling
    pub function_calling: bool,
}

/// Pricing per million tokens, in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrices {
    /// Price per million prompt tokens
    pub input: f64,
    /// Price per million completion tokens
    pub output: f64,
}

/// Model entry with descriptive metadata layered on
///
/// Enrichment fields serialize as explicit `null` when absent rather than
/// being omitted, so callers can tell "no data for this model" apart from
/// a field that was dropped by accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedModel {
    /// Model identifier
    pub id: String,
    /// Object type (always "model")
    pub object: String,
    /// Unix timestamp the model was published
    pub created: u64,
    /// Owning organization tag
    pub owned_by: String,
    /// Human-readable display name
    pub name: Option<String>,
    /// Short description of the model's niche
    pub description: Option<String>,
    /// Context window size in tokens
    pub context_length: Option<u32>,
    /// Tokenizer family tag
    pub tokenizer: Option<String>,
    /// Capability flags
    pub capabilities: Option<ModelCapabilities>,
    /// Pricing data
    pub prices: Option<ModelPrices>,
}

impl EnrichedModel {
    /// Project away the enrichment fields
    pub fn demote(&self) -> Model {
        Model {
            id: self.id.clone(),
            object: self.object.clone(),
            created: self.created,
            owned_by: self.owned_by.clone(),
        }
    }
}

/// List of bare model entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardModelList {
    /// Object type (always "list")
    pub object: String,
    /// Model entries
    pub data: Vec<Model>,
}

/// List of enriched model entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedModelList {
    /// Object type (always "list")
    pub object: String,
    /// Enriched model entries
    pub data: Vec<EnrichedModel>,
}

/// Model listing in either width, selected by the caller's enrichment flag
///
/// Serializes as whichever list it holds; match on the variant rather than
/// downcasting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelList {
    /// Bare entries
    Standard(StandardModelList),
    /// Entries with enrichment metadata
    Enriched(EnrichedModelList),
}
