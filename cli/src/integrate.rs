#![deny(missing_docs)]

//! # Integrate Command
//!
//! Builds the API Gateway document and renders the stdout envelope.
//!
//! Infrastructure tooling tends to pass unset variables as empty strings, so
//! an empty value for any optional flag counts as "not given".

use std::path::{Path, PathBuf};

use apigw_core::{
    assemble_from_files, load_maintenance, render_document, render_envelope, write_document,
    AppResult, AssemblyOptions, DeploymentType, IntegrationOptions, ParameterScope,
};

/// Arguments for the integration run.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct IntegrateArgs {
    /// OpenAPI document to integrate (required).
    #[clap(short = 'i', long, value_name = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Also write the integrated YAML to this file.
    #[clap(short = 'o', long, value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    /// Deployment type. `bff` nests every path under `/backend-for-frontend`.
    #[clap(short = 't', long = "type", value_name = "TYPE")]
    pub deployment_type: Option<String>,

    /// API version tag. Adds the `ApiVersion` stage variable to backend URIs.
    #[clap(short = 'v', long)]
    pub api_version: Option<String>,

    /// Adds the `ServicePrefix` stage variable to backend URIs.
    #[clap(short = 'p', long)]
    pub use_service_prefix: bool,

    /// Supplementary document whose paths are merged in unchanged.
    #[clap(short = 's', long, value_name = "SWAGGER_FILE")]
    pub swagger: Option<PathBuf>,

    /// Serve this document verbatim instead of integrating the input.
    #[clap(short = 'm', long, value_name = "MAINTENANCE_FILE")]
    pub maintenance_openapi: Option<PathBuf>,

    /// Do not let operations inherit path parameters declared on earlier
    /// operations of the same path.
    #[clap(long)]
    pub per_operation_parameters: bool,
}

impl IntegrateArgs {
    /// The input document, unless missing or empty.
    pub fn input_path(&self) -> Option<&Path> {
        non_empty(&self.input)
    }

    /// Converts the flags into core assembly settings.
    pub fn assembly_options(&self) -> AssemblyOptions {
        let parameter_scope = if self.per_operation_parameters {
            ParameterScope::PerOperation
        } else {
            ParameterScope::Accumulate
        };

        AssemblyOptions {
            deployment: DeploymentType::from_tag(self.deployment_type.as_deref().unwrap_or("")),
            integration: IntegrationOptions {
                api_version: self.api_version.clone().filter(|v| !v.is_empty()),
                use_service_prefix: self.use_service_prefix,
                parameter_scope,
            },
        }
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

/// Executes the run and returns the line to print on stdout.
///
/// In maintenance mode `input` is not read.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `input` - The validated input document path.
pub fn execute(args: &IntegrateArgs, input: &Path) -> AppResult<String> {
    // 1. Build Document
    let document = match non_empty(&args.maintenance_openapi) {
        Some(maintenance) => load_maintenance(maintenance)?,
        None => assemble_from_files(input, non_empty(&args.swagger), &args.assembly_options())?,
    };

    // 2. Render
    let yaml_text = render_document(&document)?;

    // 3. Write File
    if let Some(output) = non_empty(&args.output) {
        write_document(output, &yaml_text)?;
    }

    render_envelope(&yaml_text)
}
