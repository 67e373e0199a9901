//! Caption line composition.
//!
//! Pure function from one clip plus the request's overlay flags to an
//! ordered list of caption lines. At most three lines are produced:
//! headline (bold), labels, memo.

use matchcut_export_model::{ClipSpec, OverlayConfig};

/// One caption line before wrapping and escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLine {
    pub text: String,
    pub is_bold: bool,
}

/// Compose the ordered caption lines for one clip.
///
/// Deterministic and infallible. The `enabled` master switch is not
/// consulted here; callers gate the caption branch on it.
pub fn compose_overlay_lines(clip: &ClipSpec, config: &OverlayConfig) -> Vec<OverlayLine> {
    let mut lines = Vec::with_capacity(3);

    if config.show_action_name {
        let text = match config.text_template.as_deref() {
            Some(template) if !template.trim().is_empty() => render_template(template, clip),
            _ => default_headline(clip, config.show_action_index),
        };
        lines.push(OverlayLine {
            text,
            is_bold: true,
        });
    }

    if config.show_labels && !clip.labels.is_empty() {
        lines.push(OverlayLine {
            text: labels_summary(clip),
            is_bold: false,
        });
    }

    if config.show_memo {
        if let Some(memo) = clip.memo.as_deref() {
            if !memo.is_empty() {
                lines.push(OverlayLine {
                    text: memo.to_string(),
                    is_bold: false,
                });
            }
        }
    }

    lines
}

fn default_headline(clip: &ClipSpec, show_index: bool) -> String {
    if show_index {
        format!("#{} {}", clip.action_index.unwrap_or(1), clip.action_name)
    } else {
        clip.action_name.clone()
    }
}

/// Comma-joined label summary: `"{group}: {name}"`, bare name when the
/// group is empty.
fn labels_summary(clip: &ClipSpec) -> String {
    clip.labels
        .iter()
        .map(|label| {
            if label.group.is_empty() {
                label.name.clone()
            } else {
                format!("{}: {}", label.group, label.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve `{actionName}`, `{actionIndex}`, `{labels}`, and `{memo}`
/// placeholders against the clip.
fn render_template(template: &str, clip: &ClipSpec) -> String {
    template
        .replace("{actionName}", &clip.action_name)
        .replace(
            "{actionIndex}",
            &clip.action_index.unwrap_or(1).to_string(),
        )
        .replace("{labels}", &labels_summary(clip))
        .replace("{memo}", clip.memo.as_deref().unwrap_or(""))
}
