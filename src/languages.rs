//! Toolchain configuration for compilation and execution

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::core::{Language, LanguageFamily};
use crate::runner::CommandSpec;

/// Configuration for one language's toolchain
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Compile command template (None for interpreted languages)
    pub compile_command: Option<Vec<String>>,
    /// Run command template
    pub run_command: Vec<String>,
    /// Treat compiler stderr output as a failed build even on exit 0
    pub strict_diagnostics: bool,
    /// Extra environment for compile and run
    pub env: Vec<(String, String)>,
}

impl ToolchainConfig {
    pub fn interpreted(run_command: &[&str]) -> Self {
        Self {
            compile_command: None,
            run_command: run_command.iter().map(|s| s.to_string()).collect(),
            strict_diagnostics: true,
            env: Vec::new(),
        }
    }

    pub fn compiled(compile_command: &[&str], run_command: &[&str]) -> Self {
        Self {
            compile_command: Some(compile_command.iter().map(|s| s.to_string()).collect()),
            ..Self::interpreted(run_command)
        }
    }

    pub fn with_strict_diagnostics(mut self, strict: bool) -> Self {
        self.strict_diagnostics = strict;
        self
    }

    /// Build the compile command with placeholders substituted
    pub fn compile_spec(&self, vars: &Placeholders) -> Option<CommandSpec> {
        self.compile_command
            .as_ref()
            .map(|cmd| self.command_spec(cmd, vars))
    }

    /// Build the run command with placeholders substituted
    pub fn run_spec(&self, vars: &Placeholders) -> CommandSpec {
        self.command_spec(&self.run_command, vars)
    }

    fn command_spec(&self, template: &[String], vars: &Placeholders) -> CommandSpec {
        let expanded: Vec<String> = template.iter().map(|arg| vars.expand(arg)).collect();
        let mut spec = CommandSpec::from_vec(&expanded).with_work_dir(&vars.dir);
        for (key, value) in &self.env {
            spec = spec.with_env(key, value);
        }
        spec
    }
}

/// Values substituted into command templates
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    pub source: String,
    pub exe: String,
    pub dir: String,
    pub class: String,
}

impl Placeholders {
    pub fn expand(&self, arg: &str) -> String {
        arg.replace("{source}", &self.source)
            .replace("{exe}", &self.exe)
            .replace("{dir}", &self.dir)
            .replace("{class}", &self.class)
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawToolchainConfig {
    compile_command: Option<String>,
    run_command: String,
    #[serde(default = "default_strict")]
    strict_diagnostics: bool,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

fn default_strict() -> bool {
    true
}

/// Toolchains for every configured language
#[derive(Debug, Clone, Default)]
pub struct Toolchains {
    configs: HashMap<Language, ToolchainConfig>,
}

impl Toolchains {
    /// Toolchains shipped with the judge (`files/languages.toml`)
    pub fn builtin() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml_str(content).context("Invalid built-in languages.toml")
    }

    /// Load a deployment-specific toolchain file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read languages config {:?}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid languages config {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<String, RawToolchainConfig> = toml::from_str(content)?;
        let mut toolchains = Self::default();

        for (name, raw) in raw_configs {
            let language = Language::from_name(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown language in config: {}", name))?;

            let run_command = into_command(&raw.run_command);
            if run_command.is_empty() {
                anyhow::bail!("Empty run_command for {}", name);
            }

            let config = ToolchainConfig {
                compile_command: raw.compile_command.map(|cmd| into_command(&cmd)),
                run_command,
                strict_diagnostics: raw.strict_diagnostics,
                env: raw.env.into_iter().collect(),
            };
            toolchains = toolchains.with(language, config)?;
        }

        Ok(toolchains)
    }

    /// Add or replace a language's toolchain, checking it fits the language family
    pub fn with(mut self, language: Language, config: ToolchainConfig) -> anyhow::Result<Self> {
        let family = language
            .family()
            .ok_or_else(|| anyhow::anyhow!("Cannot configure a toolchain for {}", language))?;
        let has_compile = config
            .compile_command
            .as_ref()
            .map(|cmd| !cmd.is_empty())
            .unwrap_or(false);

        match family {
            LanguageFamily::Interpreted if has_compile => {
                anyhow::bail!("{} is interpreted and must not have a compile_command", language)
            }
            LanguageFamily::Native | LanguageFamily::Bytecode if !has_compile => {
                anyhow::bail!("{} requires a compile_command", language)
            }
            _ => {}
        }

        self.configs.insert(language, config);
        Ok(self)
    }

    pub fn get(&self, language: Language) -> Option<&ToolchainConfig> {
        self.configs.get(&language)
    }

    /// Configured languages
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self.configs.keys().copied().collect();
        langs.sort_by_key(|lang| lang.name());
        langs
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
