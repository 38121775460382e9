//! Model metadata catalogs and the enrichment merge
//!
//! Providers return bare model listings. A [`ModelCatalog`] holds the
//! descriptive metadata we maintain for known models (display name,
//! context window, capabilities, pricing), and [`merge`] joins a live
//! listing against it. Catalogs are built once at client construction
//! and never mutated afterwards.

use crate::types::{
    EnrichedModel, EnrichedModelList, ModelCapabilities, ModelPrices, StandardModelList,
};

/// Publication timestamp stamped on built-in catalog entries
const CATALOG_CREATED: u64 = 1_698_959_748;

const VISION_AND_TOOLS: ModelCapabilities = ModelCapabilities {
    vision: true,
    function_calling: true,
};

const TOOLS_ONLY: ModelCapabilities = ModelCapabilities {
    vision: false,
    function_calling: true,
};

const TEXT_ONLY: ModelCapabilities = ModelCapabilities {
    vision: false,
    function_calling: false,
};

/// Enrichment metadata for a provider's models, keyed by model id
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<EnrichedModel>,
}

impl ModelCatalog {
    /// Build a catalog from a list of enriched entries
    pub fn new(models: Vec<EnrichedModel>) -> Self {
        Self { models }
    }

    /// Catalog with no entries, for providers we have no metadata for
    pub const fn empty() -> Self {
        Self { models: Vec::new() }
    }

    /// Look up the enrichment entry for a model id
    pub fn get(&self, id: &str) -> Option<&EnrichedModel> {
        self.models.iter().find(|model| model.id == id)
    }

    /// Catalog contents as an enriched listing
    pub fn enriched_list(&self) -> EnrichedModelList {
        EnrichedModelList {
            object: "list".to_owned(),
            data: self.models.clone(),
        }
    }

    /// Catalog contents as a bare listing
    pub fn standard_list(&self) -> StandardModelList {
        StandardModelList {
            object: "list".to_owned(),
            data: self.models.iter().map(EnrichedModel::demote).collect(),
        }
    }

    /// Built-in metadata for the OpenAI model family
    #[allow(clippy::too_many_lines)]
    pub fn openai_defaults() -> Self {
        Self::new(vec![
            openai_entry(
                "gpt-4-turbo",
                "GPT-4 Turbo",
                "GPT-4 Turbo with Vision. The latest GPT-4 Turbo model with vision capabilities. Vision requests can now use JSON mode and function calling. Currently points to gpt-4-turbo-2024-04-09",
                128_000,
                VISION_AND_TOOLS,
                10.0,
                30.0,
            ),
            openai_entry(
                "gpt-4-turbo-2024-04-09",
                "GPT-4 Turbo (0409)",
                "GPT-4 Turbo with Vision model. Vision requests can now use JSON mode and function calling. gpt-4-turbo currently points to this version",
                128_000,
                VISION_AND_TOOLS,
                10.0,
                30.0,
            ),
            openai_entry(
                "gpt-4-turbo-preview",
                "GPT-4 Turbo Preview",
                "GPT-4 Turbo preview model. Currently points to gpt-4-0125-preview",
                128_000,
                TOOLS_ONLY,
                10.0,
                30.0,
            ),
            openai_entry(
                "gpt-4-0125-preview",
                "GPT-4 Turbo Preview (0125)",
                "GPT-4 Turbo preview model intended to reduce cases of \u{201c}laziness\u{201d} where the model doesn\u{2019}t complete a task. Returns a maximum of 4,096 output tokens",
                128_000,
                TOOLS_ONLY,
                10.0,
                30.0,
            ),
            openai_entry(
                "gpt-4-1106-preview",
                "GPT-4 Turbo Preview (1106)",
                "GPT-4 Turbo preview model featuring improved instruction following, JSON mode, reproducible outputs, parallel function calling, and more. Returns a maximum of 4,096 output tokens. This is a preview model",
                128_000,
                TOOLS_ONLY,
                10.0,
                30.0,
            ),
            openai_entry(
                "gpt-4-vision-preview",
                "GPT-4 Turbo Vision Preview",
                "GPT-4 model with the ability to understand images, in addition to all other GPT-4 Turbo capabilities. This is a preview model, we recommend developers to now use gpt-4-turbo which includes vision capabilities. Currently points to gpt-4-1106-vision-preview",
                128_000,
                VISION_AND_TOOLS,
                10.0,
                30.0,
            ),
            openai_entry(
                "gpt-4-1106-vision-preview",
                "GPT-4 Turbo Vision Preview (1106)",
                "GPT-4 model with the ability to understand images, in addition to all other GPT-4 Turbo capabilities. This is a preview model, we recommend developers to now use gpt-4-turbo which includes vision capabilities. Returns a maximum of 4,096 output tokens",
                128_000,
                VISION_AND_TOOLS,
                10.0,
                30.0,
            ),
            openai_entry(
                "gpt-4",
                "GPT-4",
                "Currently points to gpt-4-0613",
                8192,
                TOOLS_ONLY,
                30.0,
                60.0,
            ),
            openai_entry(
                "gpt-4-0613",
                "GPT-4 (0613)",
                "Snapshot of gpt-4 from June 13th 2023 with improved function calling support",
                8192,
                TOOLS_ONLY,
                30.0,
                60.0,
            ),
            openai_entry(
                "gpt-4-32k",
                "GPT-4 32K",
                "Currently points to gpt-4-32k-0613. See continuous model upgrades. This model was never rolled out widely in favor of GPT-4 Turbo",
                32_768,
                TOOLS_ONLY,
                60.0,
                120.0,
            ),
            openai_entry(
                "gpt-4-32k-0613",
                "GPT-4 32K (0613)",
                "Snapshot of gpt-4-32k from June 13th 2023 with improved function calling support. This model was never rolled out widely in favor of GPT-4 Turbo",
                32_768,
                TOOLS_ONLY,
                60.0,
                120.0,
            ),
            openai_entry(
                "gpt-3.5-turbo-0125",
                "GPT-3.5 Turbo (0125)",
                "The latest GPT-3.5 Turbo model with higher accuracy at responding in requested formats and a fix for a bug which caused a text encoding issue for non-English language function calls. Returns a maximum of 4,096 output tokens",
                16_385,
                TOOLS_ONLY,
                0.5,
                1.5,
            ),
            openai_entry(
                "gpt-3.5-turbo",
                "GPT-3.5 Turbo",
                "Currently points to gpt-3.5-turbo-0125",
                16_385,
                TOOLS_ONLY,
                0.5,
                1.5,
            ),
            openai_entry(
                "gpt-3.5-turbo-1106",
                "GPT-3.5 Turbo (1106)",
                "GPT-3.5 Turbo model with improved instruction following, JSON mode, reproducible outputs, parallel function calling, and more. Returns a maximum of 4,096 output tokens",
                16_385,
                TOOLS_ONLY,
                0.5,
                1.5,
            ),
            openai_entry(
                "gpt-3.5-turbo-0613",
                "GPT-3.5 Turbo Legacy (0613)",
                "Snapshot of gpt-3.5-turbo from June 13th 2023. Will be deprecated on June 13, 2024",
                4096,
                TOOLS_ONLY,
                0.5,
                1.5,
            ),
            openai_entry(
                "gpt-3.5-turbo-16k",
                "GPT-3.5 Turbo 16K Legacy (0613)",
                "Snapshot of gpt-3.5-16k-turbo from June 13th 2023. Will be deprecated on June 13, 2024",
                16_385,
                TOOLS_ONLY,
                0.5,
                1.5,
            ),
        ])
    }

    /// Built-in metadata for the Anthropic model family
    pub fn anthropic_defaults() -> Self {
        Self::new(vec![
            anthropic_entry(
                "claude-3-opus-20240229",
                "Claude 3 Opus",
                "Most powerful model for highly complex tasks",
                200_000,
                VISION_AND_TOOLS,
                15.0,
                75.0,
            ),
            anthropic_entry(
                "claude-3-sonnet-20240229",
                "Claude 3 Sonnet",
                "Ideal balance of intelligence and speed for enterprise workloads",
                200_000,
                VISION_AND_TOOLS,
                3.0,
                15.0,
            ),
            anthropic_entry(
                "claude-3-haiku-20240307",
                "Claude 3 Haiku",
                "Fastest and most compact model for near-instant responsiveness",
                200_000,
                VISION_AND_TOOLS,
                0.25,
                1.25,
            ),
            anthropic_entry(
                "claude-2.1",
                "Claude 2.1",
                "Updated version of Claude 2 with improved accuracy",
                200_000,
                TEXT_ONLY,
                8.0,
                24.0,
            ),
            anthropic_entry(
                "claude-2.0",
                "Claude 2",
                "Predecessor to Claude 3, offering strong all-round performance",
                100_000,
                TEXT_ONLY,
                8.0,
                24.0,
            ),
            anthropic_entry(
                "claude-instant-1.2",
                "Claude Instant 1.2",
                "Our cheapest small and fast model, a predecessor of Claude Haiku.",
                100_000,
                TEXT_ONLY,
                0.8,
                2.4,
            ),
        ])
    }
}

/// Join a live model listing with catalog metadata
///
/// Every entry of the listing survives with its own identity fields.
/// Ids missing from the catalog carry explicit nulls in the enrichment
/// fields rather than being dropped from the list.
pub fn merge(listing: &StandardModelList, catalog: &ModelCatalog) -> EnrichedModelList {
    let data = listing
        .data
        .iter()
        .map(|model| {
            let enrichment = catalog.get(&model.id);
            EnrichedModel {
                id: model.id.clone(),
                object: model.object.clone(),
                created: model.created,
                owned_by: model.owned_by.clone(),
                name: enrichment.and_then(|entry| entry.name.clone()),
                description: enrichment.and_then(|entry| entry.description.clone()),
                context_length: enrichment.and_then(|entry| entry.context_length),
                tokenizer: enrichment.and_then(|entry| entry.tokenizer.clone()),
                capabilities: enrichment.and_then(|entry| entry.capabilities),
                prices: enrichment.and_then(|entry| entry.prices),
            }
        })
        .collect();

    EnrichedModelList {
        object: "list".to_owned(),
        data,
    }
}

/// Project an enriched listing back down to the bare shape
pub fn demote(listing: &EnrichedModelList) -> StandardModelList {
    StandardModelList {
        object: "list".to_owned(),
        data: listing.data.iter().map(EnrichedModel::demote).collect(),
    }
}

fn openai_entry(
    id: &str,
    name: &str,
    description: &str,
    context_length: u32,
    capabilities: ModelCapabilities,
    input: f64,
    output: f64,
) -> EnrichedModel {
    EnrichedModel {
        id: id.to_owned(),
        object: "model".to_owned(),
        created: CATALOG_CREATED,
        owned_by: "openai".to_owned(),
        name: Some(name.to_owned()),
        description: Some(description.to_owned()),
        context_length: Some(context_length),
        tokenizer: Some("cl100k_base".to_owned()),
        capabilities: Some(capabilities),
        prices: Some(ModelPrices { input, output }),
    }
}

fn anthropic_entry(
    id: &str,
    name: &str,
    description: &str,
    context_length: u32,
    capabilities: ModelCapabilities,
    input: f64,
    output: f64,
) -> EnrichedModel {
    EnrichedModel {
        id: id.to_owned(),
        object: "model".to_owned(),
        created: CATALOG_CREATED,
        owned_by: "anthropic".to_owned(),
        name: Some(name.to_owned()),
        description: Some(description.to_owned()),
        context_length: Some(context_length),
        tokenizer: Some("anthropic".to_owned()),
        capabilities: Some(capabilities),
        prices: Some(ModelPrices { input, output }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Model;

    fn bare(id: &str, created: u64) -> Model {
        Model {
            id: id.to_owned(),
            object: "model".to_owned(),
            created,
            owned_by: "openai".to_owned(),
        }
    }

    #[test]
    fn merge_fills_unmatched_ids_with_nulls() {
        let listing = StandardModelList {
            object: "list".to_owned(),
            data: vec![bare("gpt-4", 1), bare("mystery-model", 2)],
        };

        let enriched = merge(&listing, &ModelCatalog::openai_defaults());

        assert_eq!(enriched.data.len(), 2);
        let known = &enriched.data[0];
        assert_eq!(known.name.as_deref(), Some("GPT-4"));
        assert_eq!(known.context_length, Some(8192));

        let unknown = &enriched.data[1];
        assert_eq!(unknown.id, "mystery-model");
        assert!(unknown.name.is_none());
        assert!(unknown.description.is_none());
        assert!(unknown.context_length.is_none());
        assert!(unknown.tokenizer.is_none());
        assert!(unknown.capabilities.is_none());
        assert!(unknown.prices.is_none());
    }

    #[test]
    fn merge_keeps_the_listing_identity_fields() {
        let listing = StandardModelList {
            object: "list".to_owned(),
            data: vec![bare("gpt-4", 1_234_567)],
        };

        let enriched = merge(&listing, &ModelCatalog::openai_defaults());

        // Identity comes from the live listing, metadata from the catalog.
        assert_eq!(enriched.data[0].created, 1_234_567);
        assert_eq!(enriched.data[0].prices.map(|p| p.input), Some(30.0));
    }

    #[test]
    fn merge_against_an_empty_catalog_nulls_everything() {
        let listing = StandardModelList {
            object: "list".to_owned(),
            data: vec![bare("llama-3-70b", 7)],
        };

        let enriched = merge(&listing, &ModelCatalog::empty());

        assert_eq!(enriched.data.len(), 1);
        assert!(enriched.data[0].name.is_none());
        assert!(enriched.data[0].prices.is_none());
    }

    #[test]
    fn demote_after_merge_returns_the_original_listing() {
        let listing = StandardModelList {
            object: "list".to_owned(),
            data: vec![bare("gpt-4", 10), bare("mystery-model", 20)],
        };

        let round_tripped = demote(&merge(&listing, &ModelCatalog::openai_defaults()));

        assert_eq!(round_tripped, listing);
    }

    #[test]
    fn unmatched_entries_serialize_with_explicit_nulls() {
        let listing = StandardModelList {
            object: "list".to_owned(),
            data: vec![bare("mystery-model", 2)],
        };

        let enriched = merge(&listing, &ModelCatalog::empty());
        let value = serde_json::to_value(&enriched.data[0]).unwrap();

        for field in [
            "name",
            "description",
            "context_length",
            "tokenizer",
            "capabilities",
            "prices",
        ] {
            assert!(value.get(field).is_some_and(serde_json::Value::is_null), "{field} should be an explicit null");
        }
    }

    #[test]
    fn catalog_lookup_finds_known_ids() {
        let catalog = ModelCatalog::anthropic_defaults();

        let opus = catalog.get("claude-3-opus-20240229").unwrap();
        assert_eq!(opus.context_length, Some(200_000));
        assert_eq!(opus.tokenizer.as_deref(), Some("anthropic"));

        assert!(catalog.get("claude-9").is_none());
    }

    #[test]
    fn builtin_catalogs_cover_the_expected_families() {
        assert_eq!(ModelCatalog::openai_defaults().enriched_list().data.len(), 16);
        assert_eq!(ModelCatalog::anthropic_defaults().enriched_list().data.len(), 6);
    }

    #[test]
    fn static_listings_agree_between_widths() {
        let catalog = ModelCatalog::anthropic_defaults();

        let standard = catalog.standard_list();
        assert_eq!(standard.object, "list");
        assert_eq!(standard, demote(&catalog.enriched_list()));
    }
}
