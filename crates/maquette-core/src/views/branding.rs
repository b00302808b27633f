//! Workspace branding: logo and font.

/// A font referenced by name, optionally with a web font URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    pub name: String,
    pub url: Option<String>,
}

/// Branding settings shared by every view of a workspace.
#[derive(Debug, Default)]
pub struct Branding {
    logo: Option<String>,
    font: Option<Font>,
}

impl Branding {
    /// Sets the logo, a URL or data URI.
    pub fn set_logo(&mut self, logo: &str) {
        self.logo = Some(logo.to_owned());
    }

    pub fn logo(&self) -> Option<&str> {
        self.logo.as_deref()
    }

    pub fn set_font(&mut self, name: &str, url: Option<&str>) {
        self.font = Some(Font {
            name: name.to_owned(),
            url: url.map(str::to_owned),
        });
    }

    pub fn font(&self) -> Option<&Font> {
        self.font.as_ref()
    }
}
