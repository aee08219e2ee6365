//! HTML pages. Administration pages are wrapped in the shared [`shell`],
//! pages anyone may reach leave out the stylesheet link.

use core::fmt::{self, Display, Write};

use crate::{
    config::{ProfileConfig, SystemConfig},
    defaults::{DEFAULTS, routes},
};

/// Escapes text for HTML element content and quoted attribute values.
pub struct Escaped<'a>(pub &'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                _ => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// Values shown on the administration pages.
pub struct Branding<'a> {
    /// Prefix the stylesheet is served under
    pub admin_prefix: &'a str,
    pub version: &'a str,
}

/// Write a full administration page around `content`.
pub fn shell(
    out: &mut impl Write,
    branding: &Branding<'_>,
    title: &str,
    content: impl FnOnce(&mut dyn Write) -> fmt::Result,
) -> fmt::Result {
    document(out, Some(branding.admin_prefix), branding.version, title, content)
}

/// Pages served outside the admin prefix never link into it.
fn public_shell(
    out: &mut impl Write,
    branding: &Branding<'_>,
    title: &str,
    content: impl FnOnce(&mut dyn Write) -> fmt::Result,
) -> fmt::Result {
    document(out, None, branding.version, title, content)
}

fn document(
    out: &mut impl Write,
    stylesheet_prefix: Option<&str>,
    version: &str,
    title: &str,
    content: impl FnOnce(&mut dyn Write) -> fmt::Result,
) -> fmt::Result {
    write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>{}</title>",
        Escaped(title),
    )?;
    if let Some(prefix) = stylesheet_prefix {
        write!(
            out,
            "<link rel=\"stylesheet\" href=\"{}{}\">",
            Escaped(prefix),
            routes::STYLESHEET
        )?;
    }
    write!(out, "</head><body><header><h1>{}</h1></header><main>", Escaped(title))?;
    content(out)?;
    write!(
        out,
        "</main><footer>{} {}</footer></body></html>",
        DEFAULTS.ssid_prefix,
        Escaped(version),
    )
}

/// Captive landing page.
pub fn landing(out: &mut impl Write, branding: &Branding<'_>, profile: &ProfileConfig) -> fmt::Result {
    public_shell(out, branding, &profile.title, |out| {
        if profile.message.is_empty() {
            Ok(())
        } else {
            write!(out, "<p>{}</p>", Escaped(&profile.message))
        }
    })
}

/// Configuration form, prefilled with the running configuration.
pub fn admin_home(
    out: &mut impl Write,
    branding: &Branding<'_>,
    system: &SystemConfig,
    profile: &ProfileConfig,
    network_name: &str,
) -> fmt::Result {
    shell(out, branding, "Administration", |out| {
        let prefix = Escaped(system.admin_prefix.as_str());
        write!(
            out,
            "<p>Broadcasting <b>{}</b> on channel {}.</p>",
            Escaped(network_name),
            profile.channel
        )?;
        write!(out, "<form method=\"post\" action=\"{}{}\">", prefix, routes::SAVE)?;
        text_input(out, "profile", "Profile", system.active_profile.as_str())?;
        text_input(out, "prefix", "Admin path", system.admin_prefix.as_str())?;
        text_input(out, "ssid", "Network name (empty for default)", &profile.ssid)?;
        write!(
            out,
            "<label>Channel<input type=\"number\" name=\"channel\" min=\"1\" max=\"13\" \
             value=\"{}\"></label>",
            profile.channel
        )?;
        write!(
            out,
            "<label class=\"inline\"><input type=\"checkbox\" name=\"hidden\" value=\"1\"{}>Hidden network</label>",
            if profile.hidden { " checked" } else { "" }
        )?;
        text_input(out, "title", "Page title", &profile.title)?;
        write!(
            out,
            "<label>Page message<textarea name=\"message\">{}</textarea></label>",
            Escaped(&profile.message)
        )?;
        write!(
            out,
            "<button type=\"submit\">Save and restart</button></form>\
             <p><a href=\"{}{}\">Restart without saving</a></p>",
            prefix,
            routes::RESET
        )
    })
}

fn text_input(out: &mut dyn Write, name: &str, label: &str, value: &str) -> fmt::Result {
    write!(
        out,
        "<label>{}<input type=\"text\" name=\"{}\" value=\"{}\"></label>",
        label,
        name,
        Escaped(value)
    )
}

/// Confirmation after a successful save.
pub fn saved(out: &mut impl Write, branding: &Branding<'_>, system: &SystemConfig) -> fmt::Result {
    shell(out, branding, "Saved", |out| {
        write!(
            out,
            "<p>Configuration saved. The device restarts in {} seconds.</p>\
             <p>Administration will be at <code>{}</code>.</p>",
            DEFAULTS.restart_delay.as_secs(),
            Escaped(system.admin_prefix.as_str())
        )
    })
}

pub fn restarting(out: &mut impl Write, branding: &Branding<'_>) -> fmt::Result {
    shell(out, branding, "Restarting", |out| {
        write!(
            out,
            "<p>The device restarts in {} seconds.</p>",
            DEFAULTS.restart_delay.as_secs()
        )
    })
}

/// Error page with a short explanation.
pub fn error(out: &mut impl Write, branding: &Branding<'_>, title: &str, detail: &str) -> fmt::Result {
    shell(out, branding, title, |out| write!(out, "<p class=\"error\">{}</p>", Escaped(detail)))
}

pub fn not_found(out: &mut impl Write, branding: &Branding<'_>) -> fmt::Result {
    public_shell(out, branding, "Not Found", |out| {
        write!(out, "<p class=\"error\">There is nothing at this address.</p>")
    })
}
