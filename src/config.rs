use std::path::Path;

use anyhow::{Context, Result};
use gabor_jet::{Graph, Similarity, SimilarityKind};
use gabor_wavelet::{Transform, TransformConfig};
use serde::Deserialize;

/// Top-level configuration document.
///
/// All sections are optional; missing fields take the library defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaborConfig {
    /// Gabor wavelet transform parameters.
    #[serde(default)]
    pub transform: TransformToml,

    /// Jet similarity function.
    #[serde(default)]
    pub similarity: SimilarityToml,

    /// Regular grid graph, if jets should be sampled on one.
    #[serde(default)]
    pub graph: Option<GraphToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformToml {
    #[serde(default = "default_number_of_scales")]
    pub number_of_scales: usize,
    #[serde(default = "default_number_of_directions")]
    pub number_of_directions: usize,
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    #[serde(default = "default_k_max")]
    pub k_max: f64,
    #[serde(default = "default_k_fac")]
    pub k_fac: f64,
    #[serde(default)]
    pub power_of_k: f64,
    #[serde(default = "default_true")]
    pub dc_free: bool,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for TransformToml {
    fn default() -> Self {
        Self {
            number_of_scales: default_number_of_scales(),
            number_of_directions: default_number_of_directions(),
            sigma: default_sigma(),
            k_max: default_k_max(),
            k_fac: default_k_fac(),
            power_of_k: 0.0,
            dc_free: true,
            epsilon: default_epsilon(),
        }
    }
}

fn default_number_of_scales() -> usize {
    TransformConfig::default().number_of_scales()
}
fn default_number_of_directions() -> usize {
    TransformConfig::default().number_of_directions()
}
fn default_sigma() -> f64 {
    TransformConfig::default().sigma()
}
fn default_k_max() -> f64 {
    TransformConfig::default().k_max()
}
fn default_k_fac() -> f64 {
    TransformConfig::default().k_fac()
}
fn default_true() -> bool {
    true
}
fn default_epsilon() -> f64 {
    TransformConfig::default().epsilon()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimilarityToml {
    /// Stored name of a [`SimilarityKind`], e.g. `"Canberra"`.
    #[serde(default = "default_similarity_kind")]
    pub kind: String,
}

impl Default for SimilarityToml {
    fn default() -> Self {
        Self {
            kind: default_similarity_kind(),
        }
    }
}

fn default_similarity_kind() -> String {
    SimilarityKind::PhaseDiffPlusCanberra.name().to_string()
}

/// Grid graph from `first` to `last` with `step`, all as `[row, col]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphToml {
    pub first: [i32; 2],
    pub last: [i32; 2],
    pub step: [i32; 2],
}

impl GaborConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("failed to parse TOML config")
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&toml_str)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// The `[transform]` section as a builder config.
    pub fn transform_config(&self) -> TransformConfig {
        let t = &self.transform;
        TransformConfig::new()
            .with_number_of_scales(t.number_of_scales)
            .with_number_of_directions(t.number_of_directions)
            .with_sigma(t.sigma)
            .with_k_max(t.k_max)
            .with_k_fac(t.k_fac)
            .with_power_of_k(t.power_of_k)
            .with_dc_free(t.dc_free)
            .with_epsilon(t.epsilon)
    }

    pub fn build_transform(&self) -> Result<Transform> {
        Transform::new(self.transform_config()).context("invalid [transform] section")
    }

    /// Builds the configured similarity; disparity-based kinds get the
    /// configured transform.
    pub fn build_similarity(&self) -> Result<Similarity> {
        let kind = SimilarityKind::from_name(&self.similarity.kind)
            .context("invalid [similarity] section")?;
        let transform = if kind.uses_disparity() {
            Some(self.build_transform()?)
        } else {
            None
        };
        Similarity::new(kind, transform).context("invalid [similarity] section")
    }

    /// Builds the `[graph]` grid, or `None` if the section is absent.
    pub fn build_graph(&self) -> Result<Option<Graph>> {
        self.graph
            .as_ref()
            .map(|g| Graph::grid(g.first, g.last, g.step).context("invalid [graph] section"))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const FULL: &str = r#"
        [transform]
        number_of_scales = 4
        number_of_directions = 6
        sigma = 5.0
        k_max = 1.2
        k_fac = 0.5
        power_of_k = 1.0
        dc_free = false
        epsilon = 1e-6

        [similarity]
        kind = "Canberra"

        [graph]
        first = [10, 10]
        last = [105, 60]
        step = [20, 10]
    "#;

    #[test]
    fn empty_document_uses_library_defaults() {
        let config = GaborConfig::from_toml_str("").unwrap();
        assert_eq!(config.transform_config(), TransformConfig::default());
        assert_eq!(config.similarity.kind, "PhaseDiffPlusCanberra");
        assert!(config.graph.is_none());
        assert!(config.build_graph().unwrap().is_none());
    }

    #[test]
    fn full_document() {
        let config = GaborConfig::from_toml_str(FULL).unwrap();
        let transform = config.build_transform().unwrap();
        assert_eq!(transform.number_of_wavelets(), 24);
        assert_abs_diff_eq!(transform.sigma(), 5.0);
        assert_abs_diff_eq!(transform.k_fac(), 0.5);
        assert_abs_diff_eq!(transform.power_of_k(), 1.0);
        assert!(!transform.dc_free());

        let similarity = config.build_similarity().unwrap();
        assert_eq!(similarity.kind(), SimilarityKind::Canberra);
        assert!(similarity.transform().is_none());

        let graph = config.build_graph().unwrap().unwrap();
        assert_eq!(graph.number_of_nodes(), 30);
    }

    #[test]
    fn disparity_similarity_gets_the_transform() {
        let config = GaborConfig::from_toml_str(
            "[transform]\nnumber_of_scales = 2\n[similarity]\nkind = \"PhaseDiff\"\n",
        )
        .unwrap();
        let similarity = config.build_similarity().unwrap();
        assert_eq!(
            similarity.transform().map(Transform::number_of_wavelets),
            Some(16)
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(GaborConfig::from_toml_str("[transform]\nscales = 3\n").is_err());
        assert!(GaborConfig::from_toml_str("[filter]\n").is_err());
    }

    #[test]
    fn invalid_values_reported_with_section() {
        let config = GaborConfig::from_toml_str("[transform]\nsigma = -1.0\n").unwrap();
        let err = config.build_transform().unwrap_err();
        assert!(format!("{err:#}").contains("[transform]"));

        let config = GaborConfig::from_toml_str("[similarity]\nkind = \"Cosine\"\n").unwrap();
        let err = config.build_similarity().unwrap_err();
        assert!(format!("{err:#}").contains("Cosine"));

        let config =
            GaborConfig::from_toml_str("[graph]\nfirst = [0, 0]\nlast = [4, 4]\nstep = [0, 1]\n")
                .unwrap();
        assert!(config.build_graph().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gabor.toml");
        std::fs::write(&path, FULL).unwrap();
        let config = GaborConfig::load(&path).unwrap();
        assert_eq!(config.transform.number_of_scales, 4);

        let missing = dir.path().join("missing.toml");
        let err = GaborConfig::load(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }
}
