//! # CRD Generator
//!
//! Prints the provider's CustomResourceDefinitions as a multi-document YAML
//! stream.
//!
//! ## Usage
//!
//! ```bash
//! # ProviderConfig, ProviderConfigUsage and Category
//! cargo run --bin crdgen > package/crds/magento.yaml
//!
//! # Schemaless CRDs for further managed kinds
//! cargo run --bin crdgen -- --generic Product:products --generic Attribute:attributes
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::CustomResourceExt;
use provider_magento::constants::{API_GROUP, API_VERSION};
use provider_magento::crd::{managed_crd, Category, ProviderConfig, ProviderConfigUsage};

#[derive(Debug, Parser)]
#[command(name = "crdgen", about = "Print provider-magento CRDs as YAML")]
struct Args {
    /// Extra managed kind as `Kind:plural`
    #[arg(long = "generic", value_name = "KIND:PLURAL")]
    generic: Vec<String>,
}

fn parse_generic(spec: &str) -> Result<(&str, &str)> {
    match spec.split_once(':') {
        Some((kind, plural)) if !kind.is_empty() && !plural.is_empty() => Ok((kind, plural)),
        _ => bail!("expected Kind:plural, got {spec:?}"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut crds: Vec<CustomResourceDefinition> =
        vec![ProviderConfig::crd(), ProviderConfigUsage::crd(), Category::crd()];
    for spec in &args.generic {
        let (kind, plural) = parse_generic(spec)?;
        crds.push(managed_crd(API_GROUP, API_VERSION, kind, plural));
    }

    for crd in &crds {
        let yaml = serde_yaml::to_string(crd).context("Failed to serialize CRD")?;
        println!("---\n{}", yaml.trim_end());
    }
    Ok(())
}
