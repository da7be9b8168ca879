//! Conversion from CLI arguments to client configuration and request inputs

use crate::cli::main_impl::{Cli, CliOutputFormat, InputKind};
use crate::{
    config::ClientConfig,
    options::{OutputFormat, ProcessingOptions},
    request::ImageSource,
};
use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything one CLI run needs
#[derive(Debug)]
pub(crate) struct CliInvocation {
    pub(crate) config: ClientConfig,
    pub(crate) source: ImageSource,
    pub(crate) options: ProcessingOptions,
    pub(crate) output: PathBuf,
}

pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the client config, image source and options from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<CliInvocation> {
        let api_key = Self::resolve_api_key(cli)?;

        let mut config_builder = ClientConfig::builder().api_key(api_key);
        if let Some(endpoint) = &cli.endpoint {
            config_builder = config_builder.endpoint(endpoint.clone());
        }
        if let Some(seconds) = cli.timeout {
            config_builder = config_builder.timeout(Duration::from_secs(seconds));
        }
        let config = config_builder.build().context("Invalid client configuration")?;

        let source = Self::resolve_source(cli)?;
        let format = cli.format.map(Self::output_format);
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| Self::default_output_path(&source, format));

        let mut options = ProcessingOptions::builder().output_file(output.clone());
        if let Some(size) = &cli.size {
            options = options.size(size.as_str());
        }
        if let Some(kind) = &cli.foreground_type {
            options = options.foreground_type(kind.as_str());
        }
        if let Some(format) = format {
            options = options.format(format);
        }
        if let Some(scale) = &cli.scale {
            options = options.scale(scale.clone());
        }
        if let Some(position) = &cli.position {
            options = options.position(position.clone());
        }
        if let Some(roi) = &cli.roi {
            options = options.roi(roi.clone());
        }
        if cli.crop {
            options = options.crop(true);
        }
        if let Some(margin) = &cli.crop_margin {
            options = options.crop_margin(margin.clone());
        }
        if let Some(color) = &cli.bg_color {
            options = options.bg_color(color.clone());
        }
        if let Some(url) = &cli.bg_image_url {
            options = options.bg_image_url(url.clone());
        }
        for param in &cli.params {
            let (name, value) = Self::parse_param(param)?;
            options = options.param(name, value);
        }
        let options = options.build().context("Invalid processing options")?;

        Ok(CliInvocation {
            config,
            source,
            options,
            output,
        })
    }

    /// `--api-key-file` wins over `--api-key` / `REMOVE_BG_API_KEY`
    fn resolve_api_key(cli: &Cli) -> Result<String> {
        if let Some(path) = &cli.api_key_file {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read API key file '{}'", path.display()))?;
            let key = contents.lines().next().unwrap_or_default().trim().to_string();
            if key.is_empty() {
                bail!("API key file '{}' is empty", path.display());
            }
            return Ok(key);
        }

        match &cli.api_key {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => bail!("No API key given. Use --api-key, --api-key-file or REMOVE_BG_API_KEY"),
        }
    }

    fn resolve_source(cli: &Cli) -> Result<ImageSource> {
        let kind = match cli.input_kind {
            InputKind::Auto if Self::looks_like_url(&cli.input) => InputKind::Url,
            InputKind::Auto => InputKind::File,
            explicit => explicit,
        };

        Ok(match kind {
            InputKind::Url => ImageSource::Url(cli.input.clone()),
            InputKind::Base64 => ImageSource::Base64(Self::read_base64_input(&cli.input)?),
            InputKind::File | InputKind::Auto => ImageSource::File(PathBuf::from(&cli.input)),
        })
    }

    fn looks_like_url(input: &str) -> bool {
        input.starts_with("http://") || input.starts_with("https://")
    }

    /// Base64 text from a file or stdin, with whitespace removed
    fn read_base64_input(input: &str) -> Result<String> {
        let mut text = String::new();
        if input == "-" {
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read base64 image from stdin")?;
        } else {
            text = std::fs::read_to_string(input)
                .with_context(|| format!("Failed to read base64 image from '{}'", input))?;
        }

        let encoded: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if encoded.is_empty() {
            bail!("Base64 input is empty");
        }
        Ok(encoded)
    }

    fn parse_param(param: &str) -> Result<(String, String)> {
        match param.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            },
            _ => bail!("Invalid --param '{}', expected NAME=VALUE", param),
        }
    }

    fn output_format(format: CliOutputFormat) -> OutputFormat {
        match format {
            CliOutputFormat::Auto => OutputFormat::Auto,
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpg => OutputFormat::Jpg,
            CliOutputFormat::Zip => OutputFormat::Zip,
        }
    }

    fn default_output_path(source: &ImageSource, format: Option<OutputFormat>) -> PathBuf {
        let extension = match format {
            Some(OutputFormat::Jpg) => "jpg",
            Some(OutputFormat::Zip) => "zip",
            _ => "png",
        };

        match source {
            ImageSource::File(path) => {
                let stem = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("image");
                let file_name = format!("{}-no-bg.{}", stem, extension);
                path.parent()
                    .map_or_else(|| PathBuf::from(&file_name), |parent| parent.join(&file_name))
            },
            ImageSource::Url(_) | ImageSource::Base64(_) => {
                Path::new(".").join(format!("no-bg.{}", extension))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ForegroundType, Size};
    use crate::request::{NormalizedApiParameters, ParamValue};
    use clap::Parser;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["removebg"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_url_input_detected() {
        let cli = parse(&["--api-key", "k", "https://example.com/cat.jpg"]);
        let invocation = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(
            invocation.source,
            ImageSource::Url("https://example.com/cat.jpg".to_string())
        );
        assert_eq!(invocation.output, Path::new(".").join("no-bg.png"));
        assert_eq!(invocation.config.api_key, "k");
    }

    #[test]
    fn test_file_input_default_output() {
        let cli = parse(&["--api-key", "k", "photos/cat.jpg", "--format", "zip"]);
        let invocation = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(invocation.source, ImageSource::File(PathBuf::from("photos/cat.jpg")));
        assert_eq!(invocation.output, PathBuf::from("photos/cat-no-bg.zip"));
        assert_eq!(invocation.options.format, Some(OutputFormat::Zip));
    }

    #[test]
    fn test_processing_flags() {
        let cli = parse(&[
            "--api-key",
            "k",
            "in.png",
            "--size",
            "full",
            "--type",
            "product",
            "--crop",
            "--crop-margin",
            "10%",
            "--bg-color",
            "81d4fa",
            "--param",
            "channels=alpha",
            "-o",
            "out.png",
            "--timeout",
            "30",
        ]);
        let invocation = CliConfigBuilder::from_cli(&cli).unwrap();
        let options = &invocation.options;

        assert_eq!(options.size, Some(Size::Full));
        assert_eq!(options.foreground_type, Some(ForegroundType::Product));
        assert_eq!(options.crop, Some(true));
        assert_eq!(options.crop_margin.as_deref(), Some("10%"));
        assert_eq!(options.bg_color.as_deref(), Some("81d4fa"));
        assert_eq!(options.output_file, Some(PathBuf::from("out.png")));
        assert_eq!(invocation.config.timeout, Some(Duration::from_secs(30)));

        let params = NormalizedApiParameters::from_options(options);
        assert_eq!(params.get("channels"), Some(&ParamValue::Text("alpha".to_string())));
    }

    #[test]
    fn test_crop_flag_absent_uses_default() {
        let cli = parse(&["--api-key", "k", "in.png"]);
        let invocation = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(invocation.options.crop, None);
    }

    #[test]
    fn test_missing_api_key() {
        let mut cli = parse(&["in.png"]);
        cli.api_key = None;
        let err = CliConfigBuilder::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("No API key"));
    }

    #[test]
    fn test_api_key_file_precedence() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(key_file, "  from-file  ").unwrap();
        writeln!(key_file, "ignored second line").unwrap();

        let path = key_file.path().to_str().unwrap();
        let cli = parse(&["--api-key", "from-flag", "--api-key-file", path, "in.png"]);
        let invocation = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(invocation.config.api_key, "from-file");
    }

    #[test]
    fn test_base64_input_from_file() {
        let mut b64_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(b64_file, "AAAA\nBBBB").unwrap();

        let path = b64_file.path().to_str().unwrap();
        let cli = parse(&["--api-key", "k", "--input-kind", "base64", path]);
        let invocation = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(invocation.source, ImageSource::Base64("AAAABBBB".to_string()));
    }

    #[test]
    fn test_invalid_param() {
        let cli = parse(&["--api-key", "k", "in.png", "--param", "novalue"]);
        assert!(CliConfigBuilder::from_cli(&cli).is_err());

        let cli = parse(&["--api-key", "k", "in.png", "--param", "size=full"]);
        assert!(CliConfigBuilder::from_cli(&cli).is_err());
    }

    #[test]
    fn test_background_flags_conflict() {
        let result = Cli::try_parse_from([
            "removebg",
            "--api-key",
            "k",
            "in.png",
            "--bg-color",
            "fff",
            "--bg-image-url",
            "https://example.com/bg.jpg",
        ]);
        assert!(result.is_err());
    }
}
