//! Column-aligned text tables.

#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }

    fn line(cells: &[String], widths: &[usize], sep: &str) -> String {
        widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!("{:<width$}", cell, width = *w)
            })
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// Bordered table with a line between every row.
    pub(crate) fn grid(&self) -> String {
        let widths = self.widths();
        let border = |fill: char| {
            let mut s = String::from("+");
            for w in &widths {
                s.extend(std::iter::repeat_n(fill, w + 2));
                s.push('+');
            }
            s
        };

        let mut out = String::new();
        out.push_str(&border('-'));
        out.push('\n');
        out.push_str(&format!("| {} |\n", Self::line(&self.headers, &widths, " | ")));
        out.push_str(&border('='));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format!("| {} |\n", Self::line(row, &widths, " | ")));
            out.push_str(&border('-'));
            out.push('\n');
        }
        out
    }

    /// Space-separated columns without a header.
    pub(crate) fn plain(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(Self::line(row, &widths, "  ").trim_end());
            out.push('\n');
        }
        out
    }

    /// GitHub-flavored Markdown table. Cells must already be escaped.
    pub(crate) fn markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("| {} |\n", self.headers.join(" | ")));
        out.push_str(&format!(
            "|{}|\n",
            vec![" --- "; self.headers.len()].join("|")
        ));
        for row in &self.rows {
            out.push_str(&format!("| {} |\n", row.join(" | ")));
        }
        out
    }
}
