//! HTML rendering for the menu form and command output.

use std::fmt::{self, Display, Write};

use crate::exec::CapturedOutput;
use crate::menu::Menu;

/// Display wrapper that escapes HTML special characters.
pub struct HtmlEscaped<'a>(pub &'a str);

impl Display for HtmlEscaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '&' => f.write_str("&amp;")?,
                '\'' => f.write_str("&#39;")?,
                '"' => f.write_str("&quot;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// The form page served for `GET /`, with one button per preset.
pub fn menu_page(menu: &Menu) -> String {
    let mut page = String::from(
        "<html><head><title>Menu</title></head><body bgcolor=yellow><h1>Menu</h1>\
         <form method='POST' action='/run'>\
         Command: <input name='cmd'><input type='submit'></form>",
    );

    if !menu.is_empty() {
        page.push_str("<h2>Presets</h2>");
        for entry in menu.entries() {
            // Writing into a String cannot fail.
            let _ = write!(
                page,
                "<form method='POST' action='/run'>\
                 <input type='hidden' name='cmd' value='{}'>\
                 <input type='submit' value='{}'></form>",
                HtmlEscaped(&entry.command),
                HtmlEscaped(&entry.caption),
            );
        }
    }

    page.push_str("</body></html>");
    page
}

/// The result page for `POST /run`.
pub fn output_page(output: &CapturedOutput) -> String {
    let mut page = format!(
        "<html><body bgcolor=yellow><pre>{}</pre>",
        HtmlEscaped(&output.text())
    );
    if output.truncated {
        page.push_str("<p><i>[output truncated]</i></p>");
    }
    if output.timed_out {
        page.push_str("<p><i>[command timed out and was killed]</i></p>");
    }
    page.push_str("<p><a href='/'>Back</a></p></body></html>");
    page
}
