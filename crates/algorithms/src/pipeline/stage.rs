//! Pipeline stages and the operation vocabulary

use serde::{Deserialize, Serialize};

use crate::components::{fill_holes, largest_component};
use crate::derivative::{gradient_magnitude, laplacian};
use crate::diffusion::{perona_malik, StopToken};
use crate::distance::{danielsson_distance, maurer_distance, EmptyPolicy};
use crate::intensity::{normalize, sharpen, truncate_intensity};
use crate::morphology::{morphology, ElementShape, MorphOp, StructuringElement};
use crate::pad::pad_image;
use voxkit_core::{Error, Result, VoxelGrid};

/// Operation names accepted by [`FilterStage::from_name`] with their
/// parameter lists; bracketed parameters are optional.
pub const OPERATIONS: &[(&str, &str)] = &[
    ("GD", "radius"),
    ("GE", "radius"),
    ("MD", "radius"),
    ("ME", "radius"),
    ("MO", "radius"),
    ("MC", "radius"),
    ("PadImage", "amount [fill]"),
    ("MaurerDistance", ""),
    ("D", ""),
    ("PeronaMalik", "iterations conductance"),
    ("Grad", "sigma [normalize]"),
    ("Laplacian", "sigma [normalize]"),
    ("FillHoles", ""),
    ("GetLargestComponent", ""),
    ("Normalize", ""),
    ("TruncateImageIntensity", "lower_quantile upper_quantile"),
    ("Sharpen", ""),
];

/// One filter application.
///
/// Serialized with the operation name as the `op` tag, e.g.
/// `{"op": "GD", "radius": 2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum FilterStage {
    #[serde(rename = "GD")]
    GrayscaleDilate {
        radius: i64,
        #[serde(default)]
        shape: ElementShape,
    },
    #[serde(rename = "GE")]
    GrayscaleErode {
        radius: i64,
        #[serde(default)]
        shape: ElementShape,
    },
    #[serde(rename = "MD")]
    BinaryDilate {
        radius: i64,
        #[serde(default)]
        shape: ElementShape,
    },
    #[serde(rename = "ME")]
    BinaryErode {
        radius: i64,
        #[serde(default)]
        shape: ElementShape,
    },
    #[serde(rename = "MO")]
    BinaryOpen {
        radius: i64,
        #[serde(default)]
        shape: ElementShape,
    },
    #[serde(rename = "MC")]
    BinaryClose {
        radius: i64,
        #[serde(default)]
        shape: ElementShape,
    },
    PadImage {
        /// One value for every axis, or one per axis
        amount: Vec<i64>,
        #[serde(default)]
        fill: f64,
    },
    MaurerDistance {
        #[serde(default)]
        empty: EmptyPolicy,
    },
    #[serde(rename = "D")]
    DanielssonDistance {
        #[serde(default)]
        empty: EmptyPolicy,
    },
    PeronaMalik {
        iterations: i64,
        conductance: f64,
    },
    #[serde(rename = "Grad")]
    GradientMagnitude {
        sigma: f64,
        #[serde(default)]
        normalize: bool,
    },
    Laplacian {
        sigma: f64,
        #[serde(default)]
        normalize: bool,
    },
    FillHoles,
    GetLargestComponent,
    Normalize,
    TruncateImageIntensity {
        lower_quantile: f64,
        upper_quantile: f64,
    },
    Sharpen,
}

impl FilterStage {
    /// Build a stage from its vocabulary name and positional parameters.
    ///
    /// Fails with `UnknownOperation` for an unknown name and with
    /// `InvalidParameter` for a wrong parameter count or a non-integral value
    /// where an integer is expected.
    pub fn from_name(name: &str, params: &[f64]) -> Result<Self> {
        let signature = OPERATIONS
            .iter()
            .find(|(op, _)| *op == name)
            .map(|(_, signature)| *signature)
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))?;
        let args = Args::new(name, signature, params)?;

        let stage = match name {
            "GD" => FilterStage::GrayscaleDilate {
                radius: args.int(0, "radius")?,
                shape: ElementShape::Ball,
            },
            "GE" => FilterStage::GrayscaleErode {
                radius: args.int(0, "radius")?,
                shape: ElementShape::Ball,
            },
            "MD" => FilterStage::BinaryDilate {
                radius: args.int(0, "radius")?,
                shape: ElementShape::Ball,
            },
            "ME" => FilterStage::BinaryErode {
                radius: args.int(0, "radius")?,
                shape: ElementShape::Ball,
            },
            "MO" => FilterStage::BinaryOpen {
                radius: args.int(0, "radius")?,
                shape: ElementShape::Ball,
            },
            "MC" => FilterStage::BinaryClose {
                radius: args.int(0, "radius")?,
                shape: ElementShape::Ball,
            },
            "PadImage" => FilterStage::PadImage {
                amount: vec![args.int(0, "amount")?],
                fill: args.float_or(1, 0.0),
            },
            "MaurerDistance" => FilterStage::MaurerDistance {
                empty: EmptyPolicy::Fail,
            },
            "D" => FilterStage::DanielssonDistance {
                empty: EmptyPolicy::Fail,
            },
            "PeronaMalik" => FilterStage::PeronaMalik {
                iterations: args.int(0, "iterations")?,
                conductance: args.float_or(1, 0.0),
            },
            "Grad" => FilterStage::GradientMagnitude {
                sigma: args.float_or(0, 0.0),
                normalize: args.float_or(1, 0.0) != 0.0,
            },
            "Laplacian" => FilterStage::Laplacian {
                sigma: args.float_or(0, 0.0),
                normalize: args.float_or(1, 0.0) != 0.0,
            },
            "FillHoles" => FilterStage::FillHoles,
            "GetLargestComponent" => FilterStage::GetLargestComponent,
            "Normalize" => FilterStage::Normalize,
            "TruncateImageIntensity" => FilterStage::TruncateImageIntensity {
                lower_quantile: args.float_or(0, 0.0),
                upper_quantile: args.float_or(1, 0.0),
            },
            "Sharpen" => FilterStage::Sharpen,
            other => return Err(Error::UnknownOperation(other.to_string())),
        };

        stage.validate()?;
        Ok(stage)
    }

    /// Vocabulary name of this stage
    pub fn name(&self) -> &'static str {
        match self {
            FilterStage::GrayscaleDilate { .. } => "GD",
            FilterStage::GrayscaleErode { .. } => "GE",
            FilterStage::BinaryDilate { .. } => "MD",
            FilterStage::BinaryErode { .. } => "ME",
            FilterStage::BinaryOpen { .. } => "MO",
            FilterStage::BinaryClose { .. } => "MC",
            FilterStage::PadImage { .. } => "PadImage",
            FilterStage::MaurerDistance { .. } => "MaurerDistance",
            FilterStage::DanielssonDistance { .. } => "D",
            FilterStage::PeronaMalik { .. } => "PeronaMalik",
            FilterStage::GradientMagnitude { .. } => "Grad",
            FilterStage::Laplacian { .. } => "Laplacian",
            FilterStage::FillHoles => "FillHoles",
            FilterStage::GetLargestComponent => "GetLargestComponent",
            FilterStage::Normalize => "Normalize",
            FilterStage::TruncateImageIntensity { .. } => "TruncateImageIntensity",
            FilterStage::Sharpen => "Sharpen",
        }
    }

    /// Check parameter domains without touching any grid
    pub fn validate(&self) -> Result<()> {
        match self {
            FilterStage::GrayscaleDilate { radius, .. }
            | FilterStage::GrayscaleErode { radius, .. }
            | FilterStage::BinaryDilate { radius, .. }
            | FilterStage::BinaryErode { radius, .. }
            | FilterStage::BinaryOpen { radius, .. }
            | FilterStage::BinaryClose { radius, .. } => {
                if *radius < 0 {
                    return Err(Error::InvalidRadius {
                        radius: vec![*radius],
                    });
                }
            }
            FilterStage::PadImage { amount, .. } => {
                if amount.is_empty() {
                    return Err(Error::InvalidParameter {
                        name: "amount",
                        value: "[]".to_string(),
                        reason: "at least one value is required".to_string(),
                    });
                }
            }
            FilterStage::PeronaMalik {
                iterations,
                conductance,
            } => {
                if *iterations < 0 {
                    return Err(Error::InvalidParameter {
                        name: "iterations",
                        value: iterations.to_string(),
                        reason: "must be non-negative".to_string(),
                    });
                }
                positive("conductance", *conductance)?;
            }
            FilterStage::GradientMagnitude { sigma, .. } | FilterStage::Laplacian { sigma, .. } => {
                positive("sigma", *sigma)?;
            }
            FilterStage::TruncateImageIntensity {
                lower_quantile,
                upper_quantile,
            } => {
                let valid = (0.0..=1.0).contains(lower_quantile)
                    && (0.0..=1.0).contains(upper_quantile)
                    && lower_quantile < upper_quantile;
                if !valid {
                    return Err(Error::InvalidParameter {
                        name: "quantiles",
                        value: format!("({}, {})", lower_quantile, upper_quantile),
                        reason: "expected 0 <= lower < upper <= 1".to_string(),
                    });
                }
            }
            FilterStage::MaurerDistance { .. }
            | FilterStage::DanielssonDistance { .. }
            | FilterStage::FillHoles
            | FilterStage::GetLargestComponent
            | FilterStage::Normalize
            | FilterStage::Sharpen => {}
        }
        Ok(())
    }

    /// Apply the stage, producing a new grid
    pub fn apply(&self, grid: &VoxelGrid) -> Result<VoxelGrid> {
        self.apply_with_stop(grid, None)
    }

    /// Apply the stage; iterative stages poll `stop` between iterations
    pub fn apply_with_stop(&self, grid: &VoxelGrid, stop: Option<&StopToken>) -> Result<VoxelGrid> {
        match self {
            FilterStage::GrayscaleDilate { radius, shape } => {
                apply_morphology(grid, MorphOp::GrayscaleDilate, *shape, *radius)
            }
            FilterStage::GrayscaleErode { radius, shape } => {
                apply_morphology(grid, MorphOp::GrayscaleErode, *shape, *radius)
            }
            FilterStage::BinaryDilate { radius, shape } => {
                apply_morphology(grid, MorphOp::BinaryDilate, *shape, *radius)
            }
            FilterStage::BinaryErode { radius, shape } => {
                apply_morphology(grid, MorphOp::BinaryErode, *shape, *radius)
            }
            FilterStage::BinaryOpen { radius, shape } => {
                apply_morphology(grid, MorphOp::BinaryOpen, *shape, *radius)
            }
            FilterStage::BinaryClose { radius, shape } => {
                apply_morphology(grid, MorphOp::BinaryClose, *shape, *radius)
            }
            FilterStage::PadImage { amount, fill } => pad_image(grid, amount, *fill),
            FilterStage::MaurerDistance { empty } => maurer_distance(grid, true, *empty),
            FilterStage::DanielssonDistance { empty } => danielsson_distance(grid, true, *empty),
            FilterStage::PeronaMalik {
                iterations,
                conductance,
            } => perona_malik(grid, *iterations, *conductance, stop),
            FilterStage::GradientMagnitude { sigma, normalize } => {
                gradient_magnitude(grid, *sigma, *normalize)
            }
            FilterStage::Laplacian { sigma, normalize } => laplacian(grid, *sigma, *normalize),
            FilterStage::FillHoles => fill_holes(grid),
            FilterStage::GetLargestComponent => largest_component(grid),
            FilterStage::Normalize => normalize(grid),
            FilterStage::TruncateImageIntensity {
                lower_quantile,
                upper_quantile,
            } => truncate_intensity(grid, *lower_quantile, *upper_quantile),
            FilterStage::Sharpen => sharpen(grid),
        }
    }
}

fn apply_morphology(grid: &VoxelGrid, op: MorphOp, shape: ElementShape, radius: i64) -> Result<VoxelGrid> {
    let radius = vec![radius; grid.ndim()];
    let element = StructuringElement::for_extents(shape, &radius, grid.extents())?;
    morphology(grid, op, &element)
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must be a positive finite number".to_string(),
        })
    }
}

/// Positional parameters checked against a signature such as `"sigma [normalize]"`
struct Args<'a> {
    name: &'a str,
    values: &'a [f64],
}

impl<'a> Args<'a> {
    fn new(name: &'a str, signature: &str, values: &'a [f64]) -> Result<Self> {
        let max = signature.split_whitespace().count();
        let required = signature.split_whitespace().filter(|p| !p.starts_with('[')).count();
        if values.len() < required || values.len() > max {
            let expected = if required == max {
                format!("{}", max)
            } else {
                format!("{} to {}", required, max)
            };
            return Err(Error::InvalidParameter {
                name: "params",
                value: format!("{:?}", values),
                reason: format!("{} expects {} parameter(s)", name, expected),
            });
        }
        Ok(Self { name, values })
    }

    fn float_or(&self, index: usize, default: f64) -> f64 {
        self.values.get(index).copied().unwrap_or(default)
    }

    fn int(&self, index: usize, param: &'static str) -> Result<i64> {
        let v = self.float_or(index, 0.0);
        if v.fract() != 0.0 || !(i64::MIN as f64..i64::MAX as f64).contains(&v) {
            return Err(Error::InvalidParameter {
                name: param,
                value: v.to_string(),
                reason: format!("{} expects an integer", self.name),
            });
        }
        Ok(v as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves() {
        for (name, signature) in OPERATIONS {
            let arity = signature.split_whitespace().filter(|p| !p.starts_with('[')).count();
            let params: Vec<f64> = match *name {
                "TruncateImageIntensity" => vec![0.1, 0.9],
                _ => vec![1.0; arity],
            };
            let stage = FilterStage::from_name(name, &params).unwrap();
            assert_eq!(stage.name(), *name);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            FilterStage::from_name("Blur", &[1.0]),
            Err(Error::UnknownOperation(n)) if n == "Blur"
        ));
    }

    #[test]
    fn test_arity() {
        assert!(matches!(
            FilterStage::from_name("GD", &[]),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            FilterStage::from_name("Sharpen", &[1.0]),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(FilterStage::from_name("Grad", &[1.0]).is_ok());
        assert!(FilterStage::from_name("Grad", &[1.0, 1.0]).is_ok());
        assert!(FilterStage::from_name("Grad", &[1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_integer_parameters() {
        assert!(matches!(
            FilterStage::from_name("GD", &[1.5]),
            Err(Error::InvalidParameter { name: "radius", .. })
        ));
        assert!(matches!(
            FilterStage::from_name("PeronaMalik", &[2.5, 1.0]),
            Err(Error::InvalidParameter { name: "iterations", .. })
        ));
        assert!(matches!(
            FilterStage::from_name("MD", &[-1.0]),
            Err(Error::InvalidRadius { .. })
        ));
        assert!(matches!(
            FilterStage::from_name("PadImage", &[1e19]),
            Err(Error::InvalidParameter { name: "amount", .. })
        ));

        let grid = VoxelGrid::filled(&[3, 3], 1.0).unwrap();
        let stage = FilterStage::from_name("PadImage", &[i64::MIN as f64]).unwrap();
        assert!(matches!(
            stage.apply(&grid),
            Err(Error::InvalidParameter { name: "amount", .. })
        ));
    }

    #[test]
    fn test_pad_defaults() {
        let stage = FilterStage::from_name("PadImage", &[2.0]).unwrap();
        assert_eq!(
            stage,
            FilterStage::PadImage {
                amount: vec![2],
                fill: 0.0
            }
        );
    }

    #[test]
    fn test_serde_tag() {
        let stage = FilterStage::from_name("GD", &[2.0]).unwrap();
        let json = serde_json::to_string(&stage).unwrap();
        assert!(json.contains("\"op\":\"GD\""));
        let parsed: FilterStage = serde_json::from_str(r#"{"op": "Grad", "sigma": 1.5}"#).unwrap();
        assert_eq!(
            parsed,
            FilterStage::GradientMagnitude {
                sigma: 1.5,
                normalize: false
            }
        );
    }
}
