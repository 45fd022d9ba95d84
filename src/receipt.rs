// ABOUTME: Parser for the conventional delivery receipt text carried in deliver_sm
// ABOUTME: "id:... sub:... dlvrd:... submit date:... done date:... stat:... err:... text:..."

/// Fields of a delivery receipt. Only `id` and `stat` are required; SMSCs
/// differ on the rest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReceipt {
    pub id: String,
    pub submitted: Option<u32>,
    pub delivered: Option<u32>,
    pub submit_date: Option<String>,
    pub done_date: Option<String>,
    pub stat: String,
    pub err: Option<String>,
    pub text: Option<String>,
}

impl DeliveryReceipt {
    /// Parse receipt text. Labels match case-insensitively and only at the
    /// start of a word. Returns `None` unless both `id:` and `stat:` exist.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_ascii_lowercase();
        let word = |label: &str| field(text, &lower, label).map(str::to_string);

        Some(Self {
            id: word("id:")?,
            submitted: field(text, &lower, "sub:").and_then(|v| v.parse().ok()),
            delivered: field(text, &lower, "dlvrd:").and_then(|v| v.parse().ok()),
            submit_date: word("submit date:"),
            done_date: word("done date:"),
            stat: word("stat:")?,
            err: word("err:"),
            text: label_start(&lower, "text:").map(|start| text[start..].trim().to_string()),
        })
    }

    pub fn is_delivered(&self) -> bool {
        self.stat.eq_ignore_ascii_case("DELIVRD")
    }
}

/// Byte offset just past `label` where it begins a word.
fn label_start(lower: &str, label: &str) -> Option<usize> {
    lower
        .match_indices(label)
        .find(|(idx, _)| {
            *idx == 0
                || lower[..*idx]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_whitespace)
        })
        .map(|(idx, _)| idx + label.len())
}

fn field<'a>(text: &'a str, lower: &str, label: &str) -> Option<&'a str> {
    let start = label_start(lower, label)?;
    let rest = &text[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(&rest[..end])
}
