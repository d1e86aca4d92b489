//! Board and consistency commands

use anyhow::Result;

use super::output::Output;
use crate::domain::{lanes, Client, ClientStatus};
use crate::storage::Project;

/// Shows every lane side by side in rank order
pub fn show(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let clients = project.store()?.read_all()?;
    let board = &project.config().project.board;

    if output.is_json() {
        let by_lane: serde_json::Map<String, serde_json::Value> = ClientStatus::ALL
            .iter()
            .map(|status| {
                let members: Vec<&Client> = lanes::lane(&clients, *status);
                (status.to_string(), serde_json::json!(members))
            })
            .collect();
        output.data(&by_lane);
        return Ok(());
    }

    let columns: Vec<Vec<String>> = ClientStatus::ALL
        .iter()
        .map(|status| {
            lanes::lane(&clients, *status)
                .iter()
                .flat_map(|c| card_lines(c, board.show_description))
                .collect()
        })
        .collect();

    let width = board.column_width.max(8);
    let header: Vec<String> = lanes::lane_sizes(&clients)
        .iter()
        .map(|(status, size)| fit(&format!("{} ({})", status, size), width))
        .collect();
    println!("{}", header.join(" | "));
    println!("{}", "-".repeat((width + 3) * columns.len() - 3));

    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| fit(col.get(row).map(String::as_str).unwrap_or(""), width))
            .collect();
        println!("{}", cells.join(" | "));
    }

    Ok(())
}

/// Verifies that every lane is ranked `1..=n` without gaps or duplicates
pub fn check(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let clients = project.store()?.read_all()?;
    output.verbose_ctx("check", &format!("Checking {} client(s)", clients.len()));

    match lanes::check_invariant(&clients) {
        Ok(()) => {
            if output.is_json() {
                output.data(&serde_json::json!({ "ok": true, "clients": clients.len() }));
            } else {
                output.success(&format!("All lanes consistent ({} clients)", clients.len()));
            }
            Ok(())
        }
        Err(err) => {
            if output.is_json() {
                output.data(&serde_json::json!({ "ok": false, "error": err.to_string() }));
            }
            Err(err.into())
        }
    }
}

fn card_lines(client: &Client, show_description: bool) -> Vec<String> {
    let mut lines = vec![format!("{}. {} [{}]", client.priority, client.name, client.id)];
    if show_description {
        if let Some(ref desc) = client.description {
            lines.push(format!("   {}", desc));
        }
    }
    lines
}

/// Pads or truncates to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{}{}", text, " ".repeat(width - count))
    } else {
        let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
        truncated.push('~');
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClientId;

    #[test]
    fn fit_pads_short_text() {
        assert_eq!(fit("abc", 5), "abc  ");
    }

    #[test]
    fn fit_truncates_long_text() {
        assert_eq!(fit("abcdefgh", 5), "abcd~");
    }

    #[test]
    fn card_lines_include_description_when_enabled() {
        let mut client = Client::new(ClientId::new(3).unwrap(), "Acme", ClientStatus::Backlog, 2);
        client.set_description("Renewal");

        assert_eq!(card_lines(&client, false), vec!["2. Acme [3]".to_string()]);
        assert_eq!(card_lines(&client, true).len(), 2);
    }
}
