//! Borrowed views of detector output tensors.
//!
//! `LayerView` wraps one output buffer owned by the inference runtime together
//! with its name, element type, and dimension vector. Construction checks that
//! the buffer covers every element the dimensions describe; accessors hand out
//! slices trimmed to exactly that many elements.

use crate::util::{YoloBoxError, YoloBoxResult};

/// Element type of an output layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// 32-bit IEEE float.
    Float32,
    /// 32-bit signed integer.
    Int32,
}

impl DataType {
    /// Short lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Float32 => "f32",
            DataType::Int32 => "i32",
        }
    }
}

/// Borrowed element storage of a layer.
#[derive(Clone, Copy, Debug)]
pub enum LayerData<'a> {
    Float32(&'a [f32]),
    Int32(&'a [i32]),
}

impl LayerData<'_> {
    fn len(&self) -> usize {
        match self {
            LayerData::Float32(data) => data.len(),
            LayerData::Int32(data) => data.len(),
        }
    }

    fn data_type(&self) -> DataType {
        match self {
            LayerData::Float32(_) => DataType::Float32,
            LayerData::Int32(_) => DataType::Int32,
        }
    }
}

/// Read-only view of one output tensor.
#[derive(Clone, Debug)]
pub struct LayerView<'a> {
    name: &'a str,
    dims: Vec<usize>,
    data: LayerData<'a>,
}

impl<'a> LayerView<'a> {
    /// Creates a view over float data.
    pub fn from_f32(name: &'a str, dims: &[usize], data: &'a [f32]) -> YoloBoxResult<Self> {
        Self::new(name, dims, LayerData::Float32(data))
    }

    /// Creates a view over integer data.
    pub fn from_i32(name: &'a str, dims: &[usize], data: &'a [i32]) -> YoloBoxResult<Self> {
        Self::new(name, dims, LayerData::Int32(data))
    }

    /// Creates a view, validating dimensions against the buffer length.
    pub fn new(name: &'a str, dims: &[usize], data: LayerData<'a>) -> YoloBoxResult<Self> {
        let invalid = || YoloBoxError::InvalidDimensions {
            layer: name.to_owned(),
            dims: dims.to_vec(),
        };
        if dims.is_empty() || dims.contains(&0) {
            return Err(invalid());
        }
        let needed = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(invalid)?;
        if data.len() < needed {
            return Err(YoloBoxError::BufferTooSmall {
                layer: name.to_owned(),
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            name,
            dims: dims.to_vec(),
            data,
        })
    }

    /// Returns the layer name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the dimension vector (batch dimension excluded).
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the element type.
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Returns the number of elements described by the dimensions.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the float elements, or an error for integer layers.
    pub fn as_f32(&self) -> YoloBoxResult<&'a [f32]> {
        match self.data {
            LayerData::Float32(data) => Ok(&data[..self.num_elements()]),
            LayerData::Int32(_) => Err(self.type_mismatch(DataType::Float32)),
        }
    }

    /// Returns the integer elements, or an error for float layers.
    pub fn as_i32(&self) -> YoloBoxResult<&'a [i32]> {
        match self.data {
            LayerData::Int32(data) => Ok(&data[..self.num_elements()]),
            LayerData::Float32(_) => Err(self.type_mismatch(DataType::Int32)),
        }
    }

    /// Reads the first element as a non-negative count.
    ///
    /// Count tensors are emitted as either int32 or float depending on the
    /// exporter; negative and NaN values read as zero.
    pub fn leading_count(&self) -> usize {
        match self.data {
            LayerData::Int32(data) => data[0].max(0) as usize,
            LayerData::Float32(data) => data[0].max(0.0) as usize,
        }
    }

    fn type_mismatch(&self, expected: DataType) -> YoloBoxError {
        YoloBoxError::DataTypeMismatch {
            layer: self.name.to_owned(),
            expected: expected.name(),
            got: self.data_type().name(),
        }
    }
}

/// Input resolution the detector was run at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl NetworkInfo {
    /// Creates network info for a three-channel input.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channels: 3,
        }
    }
}
