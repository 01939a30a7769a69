//! Serialized computation graph embedded after the container header.
//!
//! A graph declares its input and output tensors and an ordered list of
//! elementwise operators applied to every pixel. The operator set is exactly
//! what the fixed variants need.
//!
//! # Body layout
//! ```text
//!   u8 input count, u8 output count, u16 op count
//!   tensors  (inputs then outputs):
//!       u16 name length, name, u8 dtype, u8 rank, rank × u32 dims
//!   ops:
//!       u8 opcode
//!       ChannelMix / ChannelScale → weights block
//!           u8 encoding, u16 value count, values,
//!           int8 only: u16 scale count, scales
//!       Clamp → f32 min, f32 max
//! ```

use tonegraph_core::{ColorKernel, DType, StyleVariant, TensorSpec};

use crate::error::{BuildError, DecodeError};
use crate::format::{ByteReader, ByteWriter, FLAG_INT8_WEIGHTS, HEADER_LEN, Header};

mod opcode {
    pub const CHANNEL_MIX: u8 = 1;
    pub const CHANNEL_SCALE: u8 = 2;
    pub const CLAMP: u8 = 3;
}

mod encoding {
    pub const FLOAT32: u8 = 0;
    pub const INT8: u8 = 1;
}

/// Largest magnitude an int8 weight is quantized to.
const INT8_MAX: f32 = 127.0;

/// Weight storage for one operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Weights {
    Float32(Vec<f32>),
    Int8(Int8Weights),
}

/// Symmetric int8 weights with one f32 scale per row.
///
/// The scale count always divides the value count; only [`Weights::quantize`]
/// and the decoder construct this.
#[derive(Debug, Clone, PartialEq)]
pub struct Int8Weights {
    values: Vec<i8>,
    scales: Vec<f32>,
}

impl Int8Weights {
    pub fn values(&self) -> &[i8] {
        &self.values
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    fn row_len(&self) -> usize {
        self.values.len() / self.scales.len()
    }
}

impl Weights {
    /// Quantize `values` to int8 with one scale per `row_len` consecutive values.
    ///
    /// A `row_len` that does not divide the value count falls back to a single
    /// scale for the whole tensor.
    pub fn quantize(values: &[f32], row_len: usize) -> Self {
        let row_len = if row_len > 0 && values.len() % row_len == 0 {
            row_len
        } else {
            values.len().max(1)
        };
        let mut q = Vec::with_capacity(values.len());
        let mut scales = Vec::with_capacity(values.len() / row_len + 1);
        for row in values.chunks(row_len) {
            let max_abs = row.iter().fold(0.0_f32, |m, v| m.max(v.abs()));
            let scale = if max_abs > 0.0 { max_abs / INT8_MAX } else { 1.0 };
            scales.push(scale);
            q.extend(
                row.iter()
                    .map(|v| (v / scale).round().clamp(-INT8_MAX, INT8_MAX) as i8),
            );
        }
        if scales.is_empty() {
            scales.push(1.0);
        }
        Self::Int8(Int8Weights { values: q, scales })
    }

    /// Float values, dequantizing when stored as int8.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            Self::Float32(v) => v.clone(),
            Self::Int8(w) => {
                let row_len = w.row_len();
                w.values
                    .iter()
                    .enumerate()
                    .map(|(i, &q)| q as f32 * w.scales[i / row_len])
                    .collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float32(v) => v.len(),
            Self::Int8(w) => w.values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_int8(&self) -> bool {
        matches!(self, Self::Int8(_))
    }

    fn encode(&self, w: &mut ByteWriter) -> Result<(), BuildError> {
        match self {
            Self::Float32(values) => {
                w.put_u8(encoding::FLOAT32);
                w.put_u16(section_len("weights", values.len(), u16::MAX as usize)? as u16);
                for v in values {
                    w.put_f32(*v);
                }
            }
            Self::Int8(q) => {
                w.put_u8(encoding::INT8);
                w.put_u16(section_len("weights", q.values.len(), u16::MAX as usize)? as u16);
                for v in &q.values {
                    w.put_u8(*v as u8);
                }
                w.put_u16(section_len("scales", q.scales.len(), u16::MAX as usize)? as u16);
                for s in &q.scales {
                    w.put_f32(*s);
                }
            }
        }
        Ok(())
    }

    fn decode(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let enc = r.u8()?;
        let count = r.u16()? as usize;
        match enc {
            encoding::FLOAT32 => {
                let values = (0..count).map(|_| r.f32()).collect::<Result<_, _>>()?;
                Ok(Self::Float32(values))
            }
            encoding::INT8 => {
                let values: Vec<i8> = r.take(count)?.iter().map(|&b| b as i8).collect();
                let scale_count = r.u16()? as usize;
                let scales: Vec<f32> = (0..scale_count)
                    .map(|_| r.f32())
                    .collect::<Result<_, _>>()?;
                if scales.is_empty() || values.len() % scales.len() != 0 {
                    return Err(DecodeError::ScaleCount {
                        values: values.len(),
                        scales: scales.len(),
                    });
                }
                Ok(Self::Int8(Int8Weights { values, scales }))
            }
            other => Err(DecodeError::UnknownEncoding(other)),
        }
    }
}

/// One elementwise operator over RGB pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// 3x3 row-major channel mix, `out[i] = Σ w[i * 3 + j] * in[j]`.
    ChannelMix(Weights),
    /// Per-channel multiply.
    ChannelScale(Weights),
    Clamp { min: f32, max: f32 },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChannelMix(_) => "ChannelMix",
            Self::ChannelScale(_) => "ChannelScale",
            Self::Clamp { .. } => "Clamp",
        }
    }

    fn quantized(self) -> Self {
        match self {
            Self::ChannelMix(w) => Self::ChannelMix(Weights::quantize(&w.to_f32(), 3)),
            // The three gains share one scale.
            Self::ChannelScale(w) => Self::ChannelScale(Weights::quantize(&w.to_f32(), 3)),
            clamp @ Self::Clamp { .. } => clamp,
        }
    }

    fn check(&self) -> Result<(), DecodeError> {
        let op = self.name();
        let (weights, expected) = match self {
            Self::ChannelMix(w) => (w, 9),
            Self::ChannelScale(w) => (w, 3),
            Self::Clamp { min, max } => {
                if !(min <= max) {
                    return Err(DecodeError::InvalidOp {
                        op,
                        reason: "min exceeds max",
                    });
                }
                return Ok(());
            }
        };
        if weights.len() != expected {
            return Err(DecodeError::InvalidOp {
                op,
                reason: "wrong number of weights",
            });
        }
        Ok(())
    }

    fn encode(&self, w: &mut ByteWriter) -> Result<(), BuildError> {
        match self {
            Self::ChannelMix(weights) => {
                w.put_u8(opcode::CHANNEL_MIX);
                weights.encode(w)
            }
            Self::ChannelScale(weights) => {
                w.put_u8(opcode::CHANNEL_SCALE);
                weights.encode(w)
            }
            Self::Clamp { min, max } => {
                w.put_u8(opcode::CLAMP);
                w.put_f32(*min);
                w.put_f32(*max);
                Ok(())
            }
        }
    }

    fn decode(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let op = match r.u8()? {
            opcode::CHANNEL_MIX => Self::ChannelMix(Weights::decode(r)?),
            opcode::CHANNEL_SCALE => Self::ChannelScale(Weights::decode(r)?),
            opcode::CLAMP => Self::Clamp {
                min: r.f32()?,
                max: r.f32()?,
            },
            other => return Err(DecodeError::UnknownOpcode(other)),
        };
        op.check()?;
        Ok(op)
    }
}

/// A fixed-shape elementwise graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
    pub ops: Vec<Op>,
}

impl Graph {
    /// Graph reproducing `variant`: its linear kernel followed by a `[0, 1]` clamp.
    pub fn for_variant(variant: StyleVariant, input: TensorSpec, output: TensorSpec) -> Self {
        let linear = match variant.kernel() {
            ColorKernel::Mix(m) => {
                Op::ChannelMix(Weights::Float32(m.transpose().to_cols_array().to_vec()))
            }
            ColorKernel::Gain(g) => Op::ChannelScale(Weights::Float32(g.to_array().to_vec())),
        };
        Self {
            inputs: vec![input],
            outputs: vec![output],
            ops: vec![linear, Op::Clamp { min: 0.0, max: 1.0 }],
        }
    }

    /// Same graph with every weighted operator stored as int8.
    pub fn quantized(self) -> Self {
        Self {
            ops: self.ops.into_iter().map(Op::quantized).collect(),
            ..self
        }
    }

    pub fn has_int8_weights(&self) -> bool {
        self.ops.iter().any(|op| match op {
            Op::ChannelMix(w) | Op::ChannelScale(w) => w.is_int8(),
            Op::Clamp { .. } => false,
        })
    }

    /// Serialize header and body into one artifact buffer.
    pub fn to_artifact_bytes(&self) -> Result<Vec<u8>, BuildError> {
        let body = self.encode_body()?;
        let flags = if self.has_int8_weights() {
            FLAG_INT8_WEIGHTS
        } else {
            0
        };
        let header = Header::new(flags, body.len())?;
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Parse a full artifact buffer, header included.
    pub fn from_artifact_bytes(bytes: &[u8]) -> Result<(Header, Self), DecodeError> {
        let header = Header::parse(bytes)?;
        let body = &bytes[HEADER_LEN..];
        if body.len() != header.body_len as usize {
            return Err(DecodeError::LengthMismatch {
                declared: header.body_len as usize,
                actual: body.len(),
            });
        }
        let graph = Self::decode_body(body)?;
        Ok((header, graph))
    }

    fn encode_body(&self) -> Result<Vec<u8>, BuildError> {
        let mut w = ByteWriter::default();
        w.put_u8(section_len("inputs", self.inputs.len(), u8::MAX as usize)? as u8);
        w.put_u8(section_len("outputs", self.outputs.len(), u8::MAX as usize)? as u8);
        w.put_u16(section_len("ops", self.ops.len(), u16::MAX as usize)? as u16);
        for spec in self.inputs.iter().chain(&self.outputs) {
            encode_tensor(spec, &mut w)?;
        }
        for op in &self.ops {
            op.encode(&mut w)?;
        }
        Ok(w.into_inner())
    }

    fn decode_body(body: &[u8]) -> Result<Self, DecodeError> {
        let mut r = ByteReader::new(body);
        let n_inputs = r.u8()? as usize;
        let n_outputs = r.u8()? as usize;
        let n_ops = r.u16()? as usize;
        let inputs = (0..n_inputs)
            .map(|_| decode_tensor(&mut r))
            .collect::<Result<_, _>>()?;
        let outputs = (0..n_outputs)
            .map(|_| decode_tensor(&mut r))
            .collect::<Result<_, _>>()?;
        let ops = (0..n_ops)
            .map(|_| Op::decode(&mut r))
            .collect::<Result<_, _>>()?;
        if r.remaining() != 0 {
            return Err(DecodeError::LengthMismatch {
                declared: body.len() - r.remaining(),
                actual: body.len(),
            });
        }
        Ok(Self {
            inputs,
            outputs,
            ops,
        })
    }
}

fn section_len(section: &'static str, len: usize, max: usize) -> Result<usize, BuildError> {
    if len > max {
        return Err(BuildError::SectionOverflow { section, len, max });
    }
    Ok(len)
}

fn dtype_code(dtype: DType) -> u8 {
    match dtype {
        DType::Float32 => 0,
    }
}

fn encode_tensor(spec: &TensorSpec, w: &mut ByteWriter) -> Result<(), BuildError> {
    let name = spec.name.as_bytes();
    w.put_u16(section_len("tensor name", name.len(), u16::MAX as usize)? as u16);
    w.put_bytes(name);
    w.put_u8(dtype_code(spec.dtype));
    w.put_u8(section_len("tensor rank", spec.rank(), u8::MAX as usize)? as u8);
    for &d in &spec.shape {
        w.put_u32(section_len("tensor dimension", d, u32::MAX as usize)? as u32);
    }
    Ok(())
}

fn decode_tensor(r: &mut ByteReader<'_>) -> Result<TensorSpec, DecodeError> {
    let name_len = r.u16()? as usize;
    let name = std::str::from_utf8(r.take(name_len)?)
        .map_err(|_| DecodeError::InvalidName)?
        .to_string();
    let dtype = match r.u8()? {
        0 => DType::Float32,
        other => return Err(DecodeError::UnknownDType(other)),
    };
    let rank = r.u8()? as usize;
    let shape = (0..rank)
        .map(|_| r.u32().map(|d| d as usize))
        .collect::<Result<_, _>>()?;
    Ok(TensorSpec { name, shape, dtype })
}
