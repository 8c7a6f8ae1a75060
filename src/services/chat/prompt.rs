/// Prompt compiler for the movie assistant
///
/// Everything here is a pure function of its inputs: identical template,
/// snapshot, message and viewer name produce byte-identical prompts. The
/// model call is the only non-deterministic step in the pipeline.
use crate::models::CatalogEntry;

/// Behavioral template sent with every turn.
///
/// Placeholders: `{viewer}`, `{max_suggestions}`, `{catalog}`, `{message}`.
/// The JSON shape it mandates is what the response interpreter looks for.
pub const ASSISTANT_TEMPLATE: &str = "\
You are Zee, the movie assistant for the Zeestream streaming catalog. You \
help viewers find movies and series, recommend titles, and answer questions \
about the catalog. You are talking to {viewer}.

Follow these rules:
1. Identity and greetings: when asked who or what you are, or greeted with \
\"hi\" or \"hello\", introduce yourself as Zee, Zeestream's movie assistant, \
in one or two friendly sentences.
2. Search and recommendations: when the viewer asks for something to watch, \
looks for a specific title, or wants recommendations, respond with a single \
JSON object and nothing else, shaped exactly like this:
{\"type\": \"movies\", \"text\": \"<one short introductory sentence>\", \
\"movie_ids\": [\"<id from the catalog>\"], \"movie_names\": [\"<name from \
the catalog>\"]}
Only use ids and names that appear in the catalog below. Suggest at most \
{max_suggestions} titles. If nothing in the catalog fits the request, \
suggest the best-rated titles instead of refusing, using the same JSON \
shape.
3. Anything else: answer conversationally as a helpful assistant. Never use \
the JSON shape for ordinary conversation.

Catalog:
{catalog}

Viewer message: {message}
";

/// Viewer placeholder fallback when nobody is signed in
const GENERIC_VIEWER: &str = "a guest viewer";

/// Marker rendered instead of catalog records when the snapshot is empty
const EMPTY_CATALOG: &str = "(the catalog is currently unavailable)";

/// Resolves a template against the snapshot and the viewer's message.
#[must_use]
pub fn compile(
    template: &str,
    snapshot: &[CatalogEntry],
    user_message: &str,
    display_name: Option<&str>,
    max_suggestions: usize,
) -> String {
    let viewer = display_name.filter(|n| !n.trim().is_empty()).unwrap_or(GENERIC_VIEWER);

    template
        .replace("{viewer}", viewer)
        .replace("{max_suggestions}", &max_suggestions.to_string())
        .replace("{catalog}", &render_catalog(snapshot))
        .replace("{message}", user_message)
}

/// One compact record per entry, restricted to the fields that matter for
/// matching. Ids and names are carried verbatim so the interpreter can
/// resolve model output back to exact entries.
fn render_catalog(snapshot: &[CatalogEntry]) -> String {
    if snapshot.is_empty() {
        return EMPTY_CATALOG.to_string();
    }

    let mut out = String::with_capacity(snapshot.len() * 128);
    for entry in snapshot {
        out.push_str("- id: ");
        out.push_str(&entry.id);
        out.push_str(" | name: ");
        out.push_str(&entry.name);
        out.push_str(" | category: ");
        out.push_str(&entry.category);
        out.push_str(" | rating: ");
        out.push_str(&format!("{:.1}", entry.rating));
        if entry.is_series {
            out.push_str(" | series");
        }
        if entry.coming_soon {
            out.push_str(" | coming soon");
        }
        out.push_str(" | about: ");
        out.push_str(&entry.description.replace('\n', " "));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::entry;

    #[test]
    fn test_compile_is_deterministic() {
        let snapshot = vec![entry("m1", "Nova", 9.0), entry("m2", "Space Odyssey", 8.2)];
        let first = compile(ASSISTANT_TEMPLATE, &snapshot, "what should I watch?", Some("Ana"), 6);
        let second = compile(ASSISTANT_TEMPLATE, &snapshot, "what should I watch?", Some("Ana"), 6);
        assert_eq!(first, second);
    }

    #[test]
    fn test_compile_substitutes_all_placeholders() {
        let snapshot = vec![entry("m1", "Nova", 9.0)];
        let prompt = compile(ASSISTANT_TEMPLATE, &snapshot, "recommend a movie", Some("Ana"), 6);

        assert!(prompt.contains("talking to Ana"));
        assert!(prompt.contains("at most 6 titles"));
        assert!(prompt.contains("id: m1 | name: Nova"));
        assert!(prompt.contains("Viewer message: recommend a movie"));
        for token in ["{viewer}", "{max_suggestions}", "{catalog}", "{message}"] {
            assert!(!prompt.contains(token), "unresolved placeholder {token}");
        }
    }

    #[test]
    fn test_compile_uses_generic_viewer_when_unnamed() {
        let prompt = compile(ASSISTANT_TEMPLATE, &[], "hi", None, 6);
        assert!(prompt.contains(GENERIC_VIEWER));
        assert!(prompt.contains(EMPTY_CATALOG));
    }

    #[test]
    fn test_render_catalog_flattens_multiline_descriptions() {
        let mut item = entry("m1", "Nova", 9.0);
        item.description = "line one\nline two".to_string();
        let rendered = render_catalog(&[item]);
        assert!(rendered.contains("about: line one line two"));
        assert!(!rendered.contains("one\nline"));
    }

    #[test]
    fn test_render_catalog_marks_flags() {
        let mut item = entry("m1", "Nova", 9.0);
        item.is_series = true;
        item.coming_soon = true;
        let rendered = render_catalog(&[item]);
        assert!(rendered.contains("| series"));
        assert!(rendered.contains("| coming soon"));
    }
}
