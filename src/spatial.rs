//! Spatial parameter resolution for convolution and pooling layers

use std::fmt;

use crate::error::ImportError;
use crate::graph::{AttrValue, NodeDef};
use crate::net::{LayerParams, ParamValue};

/// Output-size convention of a spatial layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingMode {
    /// Explicit `pad_h`/`pad_w` padding. Default when no mode is set.
    Caffe,
    /// No padding; the output may shrink.
    Valid,
    /// Padding chosen so that `out = ceil(in / stride)`.
    Same,
}

impl fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaddingMode::Caffe => write!(f, "CAFFE"),
            PaddingMode::Valid => write!(f, "VALID"),
            PaddingMode::Same => write!(f, "SAME"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelParams {
    pub kernel_h: i64,
    pub kernel_w: i64,
    pub pad_h: i64,
    pub pad_w: i64,
    pub stride_h: i64,
    pub stride_w: i64,
    pub padding_mode: PaddingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub out_h: i64,
    pub out_w: i64,
    pub pad_h: i64,
    pub pad_w: i64,
}

/// Read a paired `{prefix}_h`/`{prefix}_w` value, falling back to a scalar.
fn paired_or_scalar(
    params: &LayerParams,
    h_key: &str,
    w_key: &str,
    scalar_key: &str,
) -> Option<(i64, i64)> {
    if let (Some(h), Some(w)) = (params.get_int(h_key), params.get_int(w_key)) {
        return Some((h, w));
    }
    params.get_int(scalar_key).map(|v| (v, v))
}

fn padding_mode(params: &LayerParams) -> Result<PaddingMode, ImportError> {
    match params.get("pad_mode") {
        None => Ok(PaddingMode::Caffe),
        Some(ParamValue::PaddingMode(mode)) => Ok(*mode),
        Some(ParamValue::Str(mode)) => match mode.as_str() {
            "SAME" => Ok(PaddingMode::Same),
            "VALID" => Ok(PaddingMode::Valid),
            "CAFFE" => Ok(PaddingMode::Caffe),
            other => Err(ImportError::UnsupportedPaddingMode {
                node: String::new(),
                mode: other.to_string(),
            }),
        },
        Some(other) => Err(ImportError::UnsupportedPaddingMode {
            node: String::new(),
            mode: format!("{:?}", other),
        }),
    }
}

/// Resolve kernel size, padding, stride and padding mode from layer params.
///
/// Paired `_h`/`_w` keys win over their scalar forms. Padding defaults to 0
/// and stride to 1; the kernel has no default.
pub fn resolve_kernel_params(params: &LayerParams) -> Result<KernelParams, ImportError> {
    let (kernel_h, kernel_w) = paired_or_scalar(params, "kernel_h", "kernel_w", "kernel_size")
        .ok_or_else(|| ImportError::MissingAttribute {
            node: String::new(),
            attribute: "kernel_size".to_string(),
        })?;
    let (pad_h, pad_w) = paired_or_scalar(params, "pad_h", "pad_w", "pad").unwrap_or((0, 0));
    let padding_mode = padding_mode(params)?;
    let (stride_h, stride_w) =
        paired_or_scalar(params, "stride_h", "stride_w", "stride").unwrap_or((1, 1));

    let checks: [(&'static str, i64, bool); 6] = [
        ("kernel_h", kernel_h, kernel_h > 0),
        ("kernel_w", kernel_w, kernel_w > 0),
        ("pad_h", pad_h, pad_h >= 0),
        ("pad_w", pad_w, pad_w >= 0),
        ("stride_h", stride_h, stride_h > 0),
        ("stride_w", stride_w, stride_w > 0),
    ];
    if let Some((param, value, _)) = checks.iter().find(|(_, _, ok)| !ok) {
        return Err(ImportError::InvalidSpatialParam {
            node: String::new(),
            param: *param,
            value: *value,
        });
    }

    Ok(KernelParams {
        kernel_h,
        kernel_w,
        pad_h,
        pad_w,
        stride_h,
        stride_w,
        padding_mode,
    })
}

/// Compute output extent and leading padding for VALID or SAME padding.
///
/// For SAME the total padding is `Pr = max(0, (out - 1) * s + k - in)`; only
/// the leading half `Pr / 2` is reported. Odd totals put the extra row/column
/// on the trailing side.
pub fn resolve_output_size(
    input_h: i64,
    input_w: i64,
    kernel_h: i64,
    kernel_w: i64,
    stride_h: i64,
    stride_w: i64,
    mode: PaddingMode,
) -> Result<OutputSize, ImportError> {
    if mode == PaddingMode::Caffe {
        return Err(ImportError::UnsupportedPaddingMode {
            node: String::new(),
            mode: mode.to_string(),
        });
    }
    let checks: [(&'static str, i64, bool); 4] = [
        ("kernel_h", kernel_h, kernel_h > 0),
        ("kernel_w", kernel_w, kernel_w > 0),
        ("stride_h", stride_h, stride_h > 0),
        ("stride_w", stride_w, stride_w > 0),
    ];
    if let Some((param, value, _)) = checks.iter().find(|(_, _, ok)| !ok) {
        return Err(ImportError::InvalidSpatialParam {
            node: String::new(),
            param: *param,
            value: *value,
        });
    }

    let (out_h, pad_h) = axis_extent(input_h, kernel_h, stride_h, mode).ok_or(
        ImportError::InvalidSpatialParam {
            node: String::new(),
            param: "input_h",
            value: input_h,
        },
    )?;
    let (out_w, pad_w) = axis_extent(input_w, kernel_w, stride_w, mode).ok_or(
        ImportError::InvalidSpatialParam {
            node: String::new(),
            param: "input_w",
            value: input_w,
        },
    )?;
    Ok(OutputSize {
        out_h,
        out_w,
        pad_h,
        pad_w,
    })
}

/// Output extent and leading padding along one axis; `None` on overflow.
fn axis_extent(input: i64, kernel: i64, stride: i64, mode: PaddingMode) -> Option<(i64, i64)> {
    match mode {
        PaddingMode::Same => {
            let out = input.checked_sub(1)?.checked_add(stride)? / stride;
            let total = out
                .checked_sub(1)?
                .checked_mul(stride)?
                .checked_add(kernel)?
                .checked_sub(input)?
                .max(0);
            Some((out, total / 2))
        }
        _ => Some((input.checked_sub(kernel)?.checked_add(stride)? / stride, 0)),
    }
}

/// Read a 4-entry NHWC window attribute (`strides`/`ksize`).
///
/// Batch and channel entries must be 1; returns the `(h, w)` entries.
fn nhwc_window(node: &NodeDef, attr: &str) -> Option<Result<(i64, i64), Vec<i64>>> {
    let value = node.attr(attr)?;
    let list = match value {
        AttrValue::List(list) => list.i.clone(),
        _ => return Some(Err(Vec::new())),
    };
    if list.len() != 4 || list[0] != 1 || list[3] != 1 {
        return Some(Err(list));
    }
    Some(Ok((list[1], list[2])))
}

/// Copy a node's `strides` attribute into `stride_h`/`stride_w`.
pub fn apply_strides(params: &mut LayerParams, node: &NodeDef) -> Result<(), ImportError> {
    match nhwc_window(node, "strides") {
        None => Ok(()),
        Some(Ok((h, w))) => {
            params.set("stride_h", h);
            params.set("stride_w", w);
            Ok(())
        }
        Some(Err(strides)) => Err(ImportError::UnsupportedStrideShape {
            node: node.name.clone(),
            strides,
        }),
    }
}

/// Copy a node's `ksize` attribute into `kernel_h`/`kernel_w`, defaulting
/// to a 1x1 window.
pub fn apply_ksize(params: &mut LayerParams, node: &NodeDef) -> Result<(), ImportError> {
    match nhwc_window(node, "ksize") {
        None => {
            params.set("kernel_h", 1i64);
            params.set("kernel_w", 1i64);
            Ok(())
        }
        Some(Ok((h, w))) => {
            params.set("kernel_h", h);
            params.set("kernel_w", w);
            Ok(())
        }
        Some(Err(ksize)) => Err(ImportError::UnsupportedKernelShape {
            node: node.name.clone(),
            ksize,
        }),
    }
}

/// `padding = "SAME"` selects SAME; anything else, or no attribute, is VALID.
pub fn apply_padding(params: &mut LayerParams, node: &NodeDef) {
    let mode = match node.attr("padding").and_then(AttrValue::as_str) {
        Some("SAME") => PaddingMode::Same,
        _ => PaddingMode::Valid,
    };
    params.set("pad_mode", mode);
}
