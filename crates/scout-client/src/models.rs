//! Model name resolution against what a server offers

use scout_protocol::ModelInfo;

/// The model a request should use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    /// Name as the server lists it
    pub model: String,
    /// The requested model was not available and another was chosen
    pub fell_back: bool,
}

/// Pick the model to use for `requested`
///
/// An exact name wins. A name without a tag matches any tag of the same
/// model (`llama3` matches `llama3:8b`). Otherwise the first available
/// model is used. With nothing listed, the request is passed through
/// unchanged and the server decides.
pub fn select_model(requested: &str, available: &[ModelInfo]) -> ModelSelection {
    let requested = requested.trim();

    if let Some(found) = find_model(requested, available) {
        return ModelSelection {
            model: found.name.clone(),
            fell_back: false,
        };
    }

    match available.first() {
        Some(first) => {
            tracing::info!(
                "Model '{}' not available, using '{}' instead",
                requested,
                first.name
            );
            ModelSelection {
                model: first.name.clone(),
                fell_back: true,
            }
        }
        None => ModelSelection {
            model: requested.to_string(),
            fell_back: false,
        },
    }
}

fn find_model<'a>(requested: &str, available: &'a [ModelInfo]) -> Option<&'a ModelInfo> {
    if let Some(exact) = available.iter().find(|m| m.name == requested) {
        return Some(exact);
    }
    if requested.is_empty() || requested.contains(':') {
        return None;
    }

    let prefix = format!("{}:", requested);
    available.iter().find(|m| m.name.starts_with(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(names: &[&str]) -> Vec<ModelInfo> {
        names.iter().map(|n| ModelInfo::new(*n)).collect()
    }

    #[test]
    fn test_exact_match() {
        let selection = select_model("llama3:8b", &models(&["tinyllama:latest", "llama3:8b"]));
        assert_eq!(selection.model, "llama3:8b");
        assert!(!selection.fell_back);
    }

    #[test]
    fn test_tagless_name_matches_any_tag() {
        let selection = select_model("llama3", &models(&["tinyllama:latest", "llama3:70b"]));
        assert_eq!(selection.model, "llama3:70b");
        assert!(!selection.fell_back);
    }

    #[test]
    fn test_tagged_name_does_not_match_other_tag() {
        let selection = select_model("llama3:8b", &models(&["mistral:latest", "llama3:70b"]));
        assert_eq!(selection.model, "mistral:latest");
        assert!(selection.fell_back);
    }

    #[test]
    fn test_prefix_requires_tag_separator() {
        let selection = select_model("llama", &models(&["llama3:8b"]));
        assert!(selection.fell_back);
    }

    #[test]
    fn test_empty_list_keeps_request() {
        let selection = select_model("tinyllama:latest", &[]);
        assert_eq!(selection.model, "tinyllama:latest");
        assert!(!selection.fell_back);
    }
}
