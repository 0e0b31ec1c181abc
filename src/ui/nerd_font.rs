/// Icons used in deskstrap output.
///
/// A small curated set; every glyph is from the Font Awesome range that all
/// nerd font builds ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerdFont {
    // Status and feedback
    Check,   //
    Cross,   //
    Warning, //
    Info,    //
    Skip,    //

    // Work in progress
    Download, //
    Package,  //
    Wrench,   //
    Terminal, //
    Git,      //
    Key,      //
    Desktop,  //
}

impl NerdFont {
    /// Get the glyph for this icon
    pub fn glyph(self) -> char {
        match self {
            Self::Check => '\u{f00c}',    // fa-check
            Self::Cross => '\u{f00d}',    // fa-times
            Self::Warning => '\u{f071}',  // fa-exclamation-triangle
            Self::Info => '\u{f05a}',     // fa-info-circle
            Self::Skip => '\u{f051}',     // fa-step-forward
            Self::Download => '\u{f019}', // fa-download
            Self::Package => '\u{f187}',  // fa-archive
            Self::Wrench => '\u{f0ad}',   // fa-wrench
            Self::Terminal => '\u{f120}', // fa-terminal
            Self::Git => '\u{f1d3}',      // fa-git
            Self::Key => '\u{f084}',      // fa-key
            Self::Desktop => '\u{f108}',  // fa-desktop
        }
    }
}

impl std::fmt::Display for NerdFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

impl From<NerdFont> for char {
    fn from(icon: NerdFont) -> Self {
        icon.glyph()
    }
}

impl From<NerdFont> for String {
    fn from(icon: NerdFont) -> Self {
        icon.glyph().to_string()
    }
}
