//! Vertical card rendering of retrieval results for the terminal.

use lexaid_engine::{Hit, Record, RetrievalOutcome};

const SNIPPET_LEN: usize = 160;

/// Print every hit of an outcome as a card, best match first.
pub fn print_outcome(outcome: &RetrievalOutcome) {
    if !outcome.found {
        println!("No results.");
        return;
    }
    for (i, hit) in outcome.results.iter().enumerate() {
        print_hit(i + 1, hit);
    }
}

fn print_hit(rank: usize, hit: &Hit) {
    match hit.similarity {
        Some(similarity) => println!("=== {rank}. [{}] similarity {similarity:.3} ===", hit.source),
        None => println!("=== {rank}. [{}] exact match ===", hit.source),
    }

    match &hit.record {
        Record::Section(section) => {
            row("citation", &section.citation);
            row("section", &section.section_number);
            row("title", &section.section_title);
            row("text", &snippet(&section.section_text));
        }
        Record::Case(case) => {
            row("case", &case.case_name);
            row("citation", &case.citation);
            row("court", &case.court);
            row("decided", &case.decided_date.to_string());
            row("sections", &case.sections_interpreted.join(", "));
            row("facts", &snippet(&case.facts_summary));
            row("ratio", &snippet(&case.ratio_decidendi));
        }
        Record::Playbook(playbook) => {
            row("title", &playbook.title);
            row("category", &playbook.category);
            row("difficulty", &playbook.difficulty_level);
            row("approach", &snippet(&playbook.recommended_approach));
            if !playbook.do_list.is_empty() {
                row("do", &playbook.do_list.join("; "));
            }
            if !playbook.dont_list.is_empty() {
                row("don't", &playbook.dont_list.join("; "));
            }
        }
    }
    println!();
}

fn row(label: &str, value: &str) {
    println!("  {label:<12} {value}");
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_LEN {
        return text.to_string();
    }
    let cut: String = text.chars().take(SNIPPET_LEN - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_untouched() {
        assert_eq!(snippet("brief"), "brief");
    }

    #[test]
    fn long_text_ellipsised() {
        let long = "x".repeat(500);
        let out = snippet(&long);
        assert_eq!(out.chars().count(), SNIPPET_LEN);
        assert!(out.ends_with("..."));
    }
}
