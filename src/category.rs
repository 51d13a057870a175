//! Category Classifier: map a story onto a destination category id.
//!
//! Rules are an ordered table of `(label, keywords)`. The first rule with a
//! keyword in the lowercased title + description wins, and its label is looked
//! up on the site by exact name. No match, or a failed lookup, falls back to
//! the configured default category.

use crate::config::Config;
use crate::wordpress::WordPress;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument, warn};

/// A category label and the keywords that select it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// Checked top to bottom; order matters when a story touches several fields.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        label: "Astronomy",
        keywords: &[
            "astronomy", "astronomer", "telescope", "galaxy", "nebula", "planet", "exoplanet",
            "asteroid", "comet", "meteor", "eclipse", "nasa", "black hole", "solar system", "moon",
        ],
    },
    CategoryRule {
        label: "Archaeology",
        keywords: &[
            "archaeology", "archaeologist", "archaeologists", "ancient", "excavation", "tomb",
            "artifact", "artifacts", "pharaoh", "roman", "neolithic",
        ],
    },
    CategoryRule {
        label: "Paleontology",
        keywords: &["dinosaur", "dinosaurs", "fossil", "fossils", "paleontology", "extinct", "mammoth"],
    },
    CategoryRule {
        label: "Geology",
        keywords: &[
            "geology", "volcano", "volcanic", "earthquake", "tectonic", "glacier", "cave", "mineral",
            "canyon", "geyser",
        ],
    },
    CategoryRule {
        label: "Climate",
        keywords: &["climate", "warming", "drought", "wildfire", "sea level", "carbon", "emissions"],
    },
    CategoryRule {
        label: "Neuroscience",
        keywords: &["brain", "neuron", "neurons", "neuroscience", "memory", "consciousness"],
    },
    CategoryRule {
        label: "Wildlife",
        keywords: &[
            "species", "wildlife", "bird", "birds", "insect", "insects", "whale", "whales", "coral",
            "reef", "firefly", "fireflies", "migration", "ecology",
        ],
    },
    CategoryRule {
        label: "Physics",
        keywords: &["physics", "quantum", "particle", "physicist", "physicists", "laser"],
    },
];

static RULE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    CATEGORY_RULES
        .iter()
        .map(|rule| {
            let alternatives = rule
                .keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = Regex::new(&format!(r"\b(?:{alternatives})\b")).expect("keyword regex");
            (rule.label, pattern)
        })
        .collect()
});

/// Label of the first rule whose keywords appear as whole words.
pub fn match_topic(title: &str, description: &str) -> Option<&'static str> {
    let text = format!("{title} {description}").to_lowercase();
    RULE_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&text))
        .map(|(label, _)| *label)
}

/// Pick the category id for a story.
#[instrument(level = "info", skip(wp, config, description))]
pub async fn resolve_category(
    wp: &WordPress<'_>,
    config: &Config,
    title: &str,
    description: &str,
) -> u64 {
    let Some(label) = match_topic(title, description) else {
        info!(category_id = config.default_category_id, "No keyword matched; using default category");
        return config.default_category_id;
    };

    match wp.search_categories(label).await {
        Ok(categories) => {
            match categories
                .iter()
                .find(|c| c.name.trim().eq_ignore_ascii_case(label))
            {
                Some(category) => {
                    info!(%label, category_id = category.id, "Resolved category");
                    category.id
                }
                None => {
                    warn!(%label, "Category not found on site; using default");
                    config.default_category_id
                }
            }
        }
        Err(e) => {
            warn!(%label, error = %e, "Category lookup failed; using default");
            config.default_category_id
        }
    }
}
