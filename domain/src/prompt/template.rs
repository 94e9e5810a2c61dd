//! Prompt templates for the reasoning service

use crate::selection::entities::Selection;
use crate::settlement::entities::OptionVariant;

/// Templates for the two reasoning-service calls
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for settlement option generation
    pub fn options_system() -> &'static str {
        r#"You are a neutral dispute-resolution assistant generating settlement options.
Read both parties' statements and propose concrete, actionable settlement variants.
Each variant must state its terms precisely: amounts, deadlines, and obligations.
Stay strictly neutral; never favor either party in tone or substance.
Respond with a JSON object: {"options": [{"id": "opt-1", "title": "...", "terms": "...", "rationale": "..."}]}."#
    }

    /// User prompt for settlement option generation
    pub fn options_prompt(analysis_context: &str, statements: &[(String, String)]) -> String {
        let mut prompt = String::from("Generate settlement options for the following dispute.\n\nStatements:\n");

        for (role, content) in statements {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", role, content));
        }

        if !analysis_context.is_empty() {
            prompt.push_str(&format!("\nAdditional context:\n{}\n", analysis_context));
        }

        prompt.push_str(
            r#"
Propose 3 to 5 distinct settlement variants covering the realistic range of
outcomes, from most favorable to the complainant to most favorable to the
respondent, with at least one balanced middle option. Respond with the JSON
shape given in your instructions."#,
        );

        prompt
    }

    /// System prompt for divergence reconciliation
    pub fn reconciliation_system() -> &'static str {
        r#"You are a neutral dispute-resolution assistant synthesizing a compromise.
Both parties reviewed the same settlement options and chose differently.
Your task is to combine the two chosen options into one proposal both sides
could accept, naming explicitly what each side concedes relative to its choice.
Respond with a JSON object:
{"summary": "...", "terms": "...", "concessions": {"complainant": ["..."], "respondent": ["..."]},
 "acceptance_probability": 0.0, "legal_basis": ["..."]}."#
    }

    /// User prompt for divergence reconciliation
    pub fn reconciliation_prompt(
        statements: &[(String, String)],
        selections: &[(String, &Selection, Option<&OptionVariant>)],
        variants: &[OptionVariant],
    ) -> String {
        let mut prompt = String::from("Two parties diverged on settlement options.\n\nStatements:\n");

        for (role, content) in statements {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", role, content));
        }

        prompt.push_str("\nSelections:\n");
        for (role, selection, variant) in selections {
            let title = variant.map(|v| v.title.as_str()).unwrap_or("(unknown option)");
            prompt.push_str(&format!(
                "\n--- {} chose {} ({}) ---\n",
                role,
                selection.variant_id.as_str(),
                title
            ));
            if let Some(reasoning) = &selection.reasoning {
                prompt.push_str(&format!("Reasoning: {}\n", reasoning));
            }
        }

        prompt.push_str("\nAll options that were on the table:\n");
        for variant in variants {
            prompt.push_str(&format!(
                "\n[{}] {}\nTerms: {}\nRationale: {}\n",
                variant.id.as_str(),
                variant.title,
                variant.terms,
                variant.rationale
            ));
        }

        prompt.push_str(
            r#"
Synthesize one combined proposal bridging the two chosen options. Be precise
about terms and symmetrical about concessions. Respond with the JSON shape
given in your instructions."#,
        );

        prompt
    }
}
