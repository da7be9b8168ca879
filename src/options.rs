//! Processing options accepted by the remove.bg API
//!
//! Every option is optional. Values the API may grow over time (`size`,
//! `type`, the detected foreground type) are open enums: the known values
//! are variants and anything else is carried verbatim in an escape variant.

use crate::error::{RemoveBgError, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Parameter names this crate models directly; `extra` may not reuse them.
pub(crate) const MODELED_PARAMETERS: &[&str] = &[
    "size",
    "type",
    "format",
    "scale",
    "position",
    "crop",
    "crop_margin",
    "roi",
    "bg_color",
    "bg_image_url",
    "image_url",
    "image_file",
    "image_file_b64",
];

macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $name:ident / $escape:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this crate does not know yet, sent/received as-is
            $escape(String),
        }

        impl $name {
            /// The wire representation
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::$escape(value) => value,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($wire => Self::$variant,)+
                    other => Self::$escape(other.to_string()),
                }
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self::from(s))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let value = <String as serde::Deserialize>::deserialize(deserializer)?;
                Ok(Self::from(value.as_str()))
            }
        }
    };
}

open_enum! {
    /// Maximum output resolution
    ///
    /// `medium` and `hd` are accepted by the API for backwards compatibility.
    Size / Other {
        /// ~0.25 megapixels
        Preview => "preview",
        Small => "small",
        Regular => "regular",
        /// Up to 1.5 megapixels
        Medium => "medium",
        /// Up to 4 megapixels
        Hd => "hd",
        /// Original resolution, up to 25 megapixels
        Full => "full",
        FourK => "4k",
        /// Highest resolution the image and remaining credits allow
        Auto => "auto",
    }
}

open_enum! {
    /// Hint for the kind of foreground to extract (wire name `type`)
    ForegroundType / Other {
        Auto => "auto",
        Person => "person",
        Product => "product",
        Car => "car",
    }
}

open_enum! {
    /// Foreground type detected by the API (`X-Type` response header)
    DetectedType / Unknown {
        Product => "product",
        Person => "person",
        Animal => "animal",
        Car => "car",
        Other => "other",
    }
}

/// Result image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// PNG if the result has transparent regions, JPG otherwise
    #[default]
    Auto,
    Png,
    Jpg,
    /// Color image plus alpha matte
    Zip,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Zip => "zip",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = RemoveBgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "png" => Ok(Self::Png),
            "jpg" => Ok(Self::Jpg),
            "zip" => Ok(Self::Zip),
            other => Err(RemoveBgError::invalid_options(format!(
                "unknown format '{}' (expected auto, png, jpg or zip)",
                other
            ))),
        }
    }
}

/// Processing options for a single call
///
/// Fields left as `None` are either replaced by the documented default
/// (`size`, `type`, `crop`) or omitted from the request entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingOptions {
    pub size: Option<Size>,
    pub foreground_type: Option<ForegroundType>,
    pub format: Option<OutputFormat>,
    /// Subject scale relative to the canvas, `"10%"`..`"100%"` or `"original"`
    pub scale: Option<String>,
    /// `"original"`, `"center"`, or one/two percentages
    pub position: Option<String>,
    /// Region of interest, `"<x1> <y1> <x2> <y2>"` in `px` or `%`
    pub roi: Option<String>,
    pub crop: Option<bool>,
    /// Margin around the cropped subject; only effective with `crop`
    pub crop_margin: Option<String>,
    /// Solid background color (hex or color name)
    pub bg_color: Option<String>,
    /// Background image URL
    pub bg_image_url: Option<String>,
    /// Where to write the decoded result image on success (never sent)
    pub output_file: Option<PathBuf>,
    /// Additional API parameters passed through unchanged, in order
    pub extra: Vec<(String, String)>,
}

impl ProcessingOptions {
    #[must_use]
    pub fn builder() -> ProcessingOptionsBuilder {
        ProcessingOptionsBuilder::default()
    }

    /// Check option combinations the API would reject
    ///
    /// # Errors
    /// - Both `bg_color` and `bg_image_url` are set
    /// - An extra parameter is unnamed or shadows a modeled parameter
    pub fn validate(&self) -> Result<()> {
        if self.bg_color.is_some() && self.bg_image_url.is_some() {
            return Err(RemoveBgError::invalid_options(
                "bg_color and bg_image_url are mutually exclusive",
            ));
        }

        for (name, _) in &self.extra {
            if name.trim().is_empty() {
                return Err(RemoveBgError::invalid_options(
                    "extra parameter name must not be empty",
                ));
            }
            if MODELED_PARAMETERS.contains(&name.as_str()) {
                return Err(RemoveBgError::invalid_options(format!(
                    "extra parameter '{}' duplicates a built-in option",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Builder for `ProcessingOptions`
#[derive(Debug, Default)]
pub struct ProcessingOptionsBuilder {
    options: ProcessingOptions,
}

impl ProcessingOptionsBuilder {
    #[must_use]
    pub fn size<S: Into<Size>>(mut self, size: S) -> Self {
        self.options.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn foreground_type<T: Into<ForegroundType>>(mut self, foreground_type: T) -> Self {
        self.options.foreground_type = Some(foreground_type.into());
        self
    }

    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.options.format = Some(format);
        self
    }

    #[must_use]
    pub fn scale<S: Into<String>>(mut self, scale: S) -> Self {
        self.options.scale = Some(scale.into());
        self
    }

    #[must_use]
    pub fn position<S: Into<String>>(mut self, position: S) -> Self {
        self.options.position = Some(position.into());
        self
    }

    #[must_use]
    pub fn roi<S: Into<String>>(mut self, roi: S) -> Self {
        self.options.roi = Some(roi.into());
        self
    }

    #[must_use]
    pub fn crop(mut self, crop: bool) -> Self {
        self.options.crop = Some(crop);
        self
    }

    #[must_use]
    pub fn crop_margin<S: Into<String>>(mut self, margin: S) -> Self {
        self.options.crop_margin = Some(margin.into());
        self
    }

    #[must_use]
    pub fn bg_color<S: Into<String>>(mut self, color: S) -> Self {
        self.options.bg_color = Some(color.into());
        self
    }

    #[must_use]
    pub fn bg_image_url<S: Into<String>>(mut self, url: S) -> Self {
        self.options.bg_image_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn output_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.output_file = Some(path.into());
        self
    }

    /// Add a parameter this crate does not model
    #[must_use]
    pub fn param<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.options.extra.push((name.into(), value.into()));
        self
    }

    /// Build and validate the options
    pub fn build(self) -> Result<ProcessingOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}
