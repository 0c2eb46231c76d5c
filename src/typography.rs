//! Site typography. [`TypographyConfig`] enumerates the recognized options
//! and is read once from the project file; [`init`] turns it into the
//! process-wide [`Typography`] exactly once at startup. Templates receive the
//! generated stylesheet ([`Typography::css`]) and the Google Fonts link
//! ([`Typography::google_fonts_url`]).

use serde::Deserialize;
use std::convert::TryFrom;
use std::fmt;
use std::sync::OnceLock;

/// The browser's default root font size, in pixels.
const BROWSER_FONT_SIZE: f64 = 16.0;

/// Generic CSS families are emitted unquoted.
const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
];

/// A font size in pixels, written as e.g. `18px` in the project file.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct FontSize(f64);

impl FontSize {
    pub fn px(self) -> f64 {
        self.0
    }
}

impl TryFrom<String> for FontSize {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let px = s
            .trim()
            .strip_suffix("px")
            .and_then(|n| n.trim().parse::<f64>().ok())
            .filter(|n| *n > 0.0)
            .ok_or_else(|| format!("invalid font size `{}`, expected e.g. `18px`", s))?;
        Ok(FontSize(px))
    }
}

/// A Google Fonts family and the weights/styles to load.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleFont {
    pub name: String,
    #[serde(default)]
    pub styles: Vec<String>,
}

/// The typography options recognized in the project file's `typography`
/// section. Every option is optional; defaults are the Revved blog's.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypographyConfig {
    pub base_font_size: FontSize,
    pub base_line_height: f64,
    pub body_weight: u16,
    pub bold_weight: u16,
    pub header_font_family: Vec<String>,
    pub body_font_family: Vec<String>,
    pub google_fonts: Vec<GoogleFont>,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        let family = vec![
            String::from("Lato"),
            String::from("Tacoma"),
            String::from("sans-serif"),
        ];
        TypographyConfig {
            base_font_size: FontSize(18.0),
            base_line_height: 1.75,
            body_weight: 400,
            bold_weight: 700,
            header_font_family: family.clone(),
            body_font_family: family,
            google_fonts: vec![GoogleFont {
                name: String::from("Lato"),
                styles: vec![String::from("400"), String::from("700")],
            }],
        }
    }
}

/// Resolved typography: the stylesheet and font link derived from a
/// [`TypographyConfig`].
#[derive(Debug)]
pub struct Typography {
    css: String,
    google_fonts_url: Option<String>,
}

impl Typography {
    pub fn new(config: TypographyConfig) -> Typography {
        Typography {
            css: stylesheet(&config),
            google_fonts_url: google_fonts_url(&config.google_fonts),
        }
    }

    /// The base stylesheet.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// The Google Fonts stylesheet URL, if any fonts are configured.
    pub fn google_fonts_url(&self) -> Option<&str> {
        self.google_fonts_url.as_deref()
    }
}

static TYPOGRAPHY: OnceLock<Typography> = OnceLock::new();

/// Installs the process-wide typography and returns it. Call once at
/// startup; later calls fail with [`AlreadyInitialized`] and leave the first
/// value in place.
pub fn init(config: TypographyConfig) -> Result<&'static Typography, AlreadyInitialized> {
    let mut installed = false;
    let typography = TYPOGRAPHY.get_or_init(|| {
        installed = true;
        Typography::new(config)
    });
    match installed {
        true => Ok(typography),
        false => Err(AlreadyInitialized),
    }
}

/// Returned by a second call to [`init`].
#[derive(Debug, PartialEq, Eq)]
pub struct AlreadyInitialized;

impl fmt::Display for AlreadyInitialized {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "typography is already initialized")
    }
}

impl std::error::Error for AlreadyInitialized {}

fn font_stack(families: &[String]) -> String {
    families
        .iter()
        .map(|family| match GENERIC_FAMILIES.contains(&family.as_str()) {
            true => family.clone(),
            false => format!("'{}'", family),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn stylesheet(config: &TypographyConfig) -> String {
    let root_percent = config.base_font_size.px() / BROWSER_FONT_SIZE * 100.0;
    let header_stack = font_stack(&config.header_font_family);
    let body_stack = font_stack(&config.body_font_family);
    format!(
        "html {{ font-size: {root}%; line-height: {line_height}; }}\n\
         body {{ font-family: {body}; font-weight: {body_weight}; }}\n\
         h1, h2, h3, h4, h5, h6 {{ font-family: {header}; font-weight: {bold_weight}; }}\n\
         b, strong {{ font-weight: {bold_weight}; }}\n",
        root = root_percent,
        line_height = config.base_line_height,
        body = body_stack,
        body_weight = config.body_weight,
        header = header_stack,
        bold_weight = config.bold_weight,
    )
}

fn google_fonts_url(fonts: &[GoogleFont]) -> Option<String> {
    if fonts.is_empty() {
        return None;
    }
    let families = fonts
        .iter()
        .map(|font| {
            let name = font.name.replace(' ', "+");
            match font.styles.is_empty() {
                true => name,
                false => format!("{}:{}", name, font.styles.join(",")),
            }
        })
        .collect::<Vec<_>>()
        .join("|");
    Some(format!("https://fonts.googleapis.com/css?family={}", families))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_stylesheet() {
        let typography = Typography::new(TypographyConfig::default());
        let css = typography.css();
        assert!(css.contains("html { font-size: 112.5%; line-height: 1.75; }"));
        assert!(css.contains("body { font-family: 'Lato', 'Tacoma', sans-serif; font-weight: 400; }"));
        assert!(css.contains("b, strong { font-weight: 700; }"));
        assert_eq!(
            Some("https://fonts.googleapis.com/css?family=Lato:400,700"),
            typography.google_fonts_url()
        );
    }

    #[test]
    fn test_parse_config() -> Result<(), serde_yaml::Error> {
        let config: TypographyConfig = serde_yaml::from_str(
            "base_font_size: 16px\nbody_font_family: [Open Sans, serif]\ngoogle_fonts: []\n",
        )?;
        assert_eq!(16.0, config.base_font_size.px());
        assert_eq!(1.75, config.base_line_height);

        let typography = Typography::new(config);
        assert!(typography.css().contains("font-size: 100%"));
        assert!(typography.css().contains("'Open Sans', serif"));
        assert_eq!(None, typography.google_fonts_url());
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_option_and_bad_size() {
        assert!(serde_yaml::from_str::<TypographyConfig>("font_size: 18px\n").is_err());
        assert!(serde_yaml::from_str::<TypographyConfig>("base_font_size: large\n").is_err());
    }

    #[test]
    fn test_init_is_write_once() {
        // Other tests never call `init`, so the first call here wins.
        assert!(init(TypographyConfig::default()).is_ok());
        let second = init(TypographyConfig::default());
        assert_eq!(Err(AlreadyInitialized), second.map(|_| ()));
        assert!(TYPOGRAPHY.get().is_some());
    }
}
