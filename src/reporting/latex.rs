use crate::cleaning::outcomes::OUTCOME_COLUMNS;
use crate::survey::Condition;
use std::collections::BTreeMap;

/// Escapes characters with special meaning in LaTeX text mode.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Booktabs tabular with one row per condition and one column per outcome,
/// indexed by `condition`.
pub fn summary_to_latex(summary: &BTreeMap<Condition, [String; 4]>) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "\\begin{{tabular}}{{l{}}}",
        "l".repeat(OUTCOME_COLUMNS.len())
    ));
    lines.push("\\toprule".to_string());

    let header: Vec<String> = OUTCOME_COLUMNS.iter().map(|c| escape_latex(c)).collect();
    lines.push(format!(" & {} \\\\", header.join(" & ")));
    lines.push(format!(
        "condition & {} \\\\",
        vec![""; OUTCOME_COLUMNS.len()].join(" & ")
    ));
    lines.push("\\midrule".to_string());

    for (condition, cells) in summary {
        let cells: Vec<String> = cells.iter().map(|c| escape_latex(c)).collect();
        lines.push(format!("{} & {} \\\\", condition.code(), cells.join(" & ")));
    }

    lines.push("\\bottomrule".to_string());
    lines.push("\\end{tabular}".to_string());

    let mut table = lines.join("\n");
    table.push('\n');
    table
}
