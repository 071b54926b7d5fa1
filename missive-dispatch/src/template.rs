//! Rendering of email bodies
//!
//! Two flavours: the fixed default campaign body personalised with the
//! recipient's name, and caller-supplied templates with `{{firstName}}`
//! placeholder substitution. Rendering is pure and never fails; a missing
//! name falls back to a neutral greeting.

/// Greeting used when the recipient's first name is empty or absent
pub const DEFAULT_NAME: &str = "there";

/// Placeholder recognised in caller-supplied body templates
pub const PLACEHOLDER: &str = "{{firstName}}";

fn name_or_default(first_name: &str) -> &str {
    let trimmed = first_name.trim();
    if trimmed.is_empty() { DEFAULT_NAME } else { trimmed }
}

/// Render the default promotional body for a recipient
#[must_use]
pub fn render(first_name: &str) -> String {
    let name = name_or_default(first_name);

    format!(
        "<html>\
         <body>\
         <h1>Hi {name},</h1>\
         <p>Welcome to our email SaaS. Reach your audience without wiring up \
         a mail server of your own.</p>\
         <p>Send your first campaign today and see it land in seconds.</p>\
         </body>\
         </html>"
    )
}

/// Personalise a caller-supplied body template
///
/// Every occurrence of `{{firstName}}` is replaced; a body without the
/// placeholder is returned verbatim.
#[must_use]
pub fn personalise(body: &str, first_name: &str) -> String {
    body.replace(PLACEHOLDER, name_or_default(first_name))
}
