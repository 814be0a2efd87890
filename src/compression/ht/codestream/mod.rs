
//! The interface of the codestream engine that compresses the components of a chunk.
//! The bridge is written once against these traits.
//! Exactly one engine implementation is selected when building the crate.

#[cfg(feature = "reference-codestream")]
pub mod reference;

#[cfg(not(feature = "reference-codestream"))]
compile_error!("a codestream engine feature must be enabled, for example \"reference-codestream\"");

use smallvec::SmallVec;

use crate::compression::{ByteVec, Bytes};
use crate::error::{Error, Result, UnitResult};
use crate::math::{ceil_div, Vec2};
use super::messages::MessageHandler;


/// The encoder of the engine selected at build time.
#[cfg(feature = "reference-codestream")]
pub type DefaultEncoder<'m> = reference::ReferenceEncoder<'m>;

/// The decoder of the engine selected at build time.
#[cfg(feature = "reference-codestream")]
pub type DefaultDecoder<'d> = reference::ReferenceDecoder<'d>;


/// The geometry and the sample format of the image and its components,
/// on the reference grid of the codestream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizeParameters {

    /// The first pixel of the image on the reference grid.
    pub image_offset: Vec2<usize>,

    /// The end of the image on the reference grid (exclusive, absolute).
    pub image_extent: Vec2<usize>,

    /// The origin of the tile grid.
    pub tile_offset: Vec2<usize>,

    /// The size of one tile.
    pub tile_size: Vec2<usize>,

    /// One entry per component, in codestream order.
    pub components: SmallVec<[ComponentParameters; 5]>,
}

/// The sample format and sub-sampling of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentParameters {

    /// A component has one sample per `sampling` pixels, along each axis.
    pub sampling: Vec2<usize>,

    /// Number of significant bits per sample.
    pub bit_depth: u8,

    /// Whether the samples are two's complement numbers.
    pub is_signed: bool,

    /// Whether the samples are the bits of floating point numbers,
    /// which the engine maps with the non-linear "type 3" transformation.
    pub nonlinear: bool,
}

/// How the samples are transformed and coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingParameters {

    /// Use the reversible wavelet, making the compression lossless.
    pub reversible: bool,

    /// Decorrelate the first three components with the reversible color transform.
    pub color_transform: bool,

    /// Number of wavelet decomposition levels.
    pub decomposition_levels: u8,

    /// Size of the code blocks. Both dimensions must be powers of two.
    pub block_size: Vec2<usize>,
}

/// A decoded line of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'l> {

    /// The index of the component that this line belongs to.
    pub component: usize,

    /// One sample per column of the component.
    pub samples: &'l [i32],
}

/// A line of a component that the caller fills with samples.
#[derive(Debug, PartialEq, Eq)]
pub struct LineMut<'l> {

    /// The index of the component that this line belongs to.
    pub component: usize,

    /// One sample per column of the component.
    pub samples: &'l mut [i32],
}


/// Compresses the lines of all components into a codestream.
///
/// Usage: set the parameters through `access_siz` and `access_cod`,
/// call `write_headers`, fill every line handed out by `exchange`, and `flush`.
pub trait CodestreamEncoder<'m>: Sized {

    /// Create an empty codestream with default parameters.
    fn new(messages: &'m dyn MessageHandler) -> Self;

    /// The image and component geometry. Only writable before `write_headers`.
    fn access_siz(&mut self) -> &mut SizeParameters;

    /// The transformation and coding options. Only writable before `write_headers`.
    fn access_cod(&mut self) -> &mut CodingParameters;

    /// In planar mode, all lines of one component are exchanged before the next component.
    /// Otherwise, lines are interleaved by row of the reference grid.
    fn set_planar(&mut self, planar: bool);

    /// Validate the parameters and write the codestream headers into the output.
    fn write_headers(&mut self, output: ByteVec) -> UnitResult;

    /// Hand over the line returned by the previous call if `commit_previous` is set,
    /// then return the next line that must be filled.
    /// Without `commit_previous`, the previous line is handed out again.
    /// Returns `None` once all lines of all components have been committed.
    fn exchange(&mut self, commit_previous: bool) -> Result<Option<LineMut<'_>>>;

    /// Compress all committed lines and finish the codestream.
    fn flush(&mut self) -> UnitResult;

    /// The number of codestream bytes written so far.
    fn tell(&self) -> usize;

    /// The complete codestream. Only contains all data after `flush`.
    fn into_output(self) -> ByteVec;
}

/// Decompresses the lines of all components from a codestream.
///
/// Usage: `from_bytes`, `read_headers`, inspect `siz`, optionally `set_planar`,
/// `create`, and `pull` every line of every component.
pub trait CodestreamDecoder<'d>: Sized {

    /// Prepare reading the codestream. Does not inspect the bytes yet.
    fn from_bytes(bytes: Bytes<'d>, messages: &'d dyn MessageHandler) -> Self;

    /// Parse the codestream headers.
    fn read_headers(&mut self) -> UnitResult;

    /// The image and component geometry. Available after `read_headers`.
    fn siz(&self) -> &SizeParameters;

    /// The transformation and coding options. Available after `read_headers`.
    fn cod(&self) -> &CodingParameters;

    /// Choose the order in which `pull` returns the lines, see `CodestreamEncoder::set_planar`.
    fn set_planar(&mut self, planar: bool);

    /// Decompress the codestream. Must be called after `read_headers` and before `pull`.
    fn create(&mut self) -> UnitResult;

    /// The next decoded line.
    fn pull(&mut self) -> Result<Line<'_>>;
}


impl Default for ComponentParameters {
    fn default() -> Self {
        ComponentParameters { sampling: Vec2(1, 1), bit_depth: 8, is_signed: false, nonlinear: false }
    }
}

impl Default for CodingParameters {
    fn default() -> Self {
        CodingParameters {
            reversible: true,
            color_transform: false,
            decomposition_levels: 5,
            block_size: Vec2(64, 64),
        }
    }
}

impl SizeParameters {

    /// Resize the component list, adding components with default parameters.
    pub fn set_num_components(&mut self, count: usize) {
        self.components.resize(count, ComponentParameters::default());
    }

    /// Replace the parameters of the component with the specified index.
    pub fn set_component(&mut self, index: usize, component: ComponentParameters) -> UnitResult {
        let target = self.components.get_mut(index)
            .ok_or_else(|| Error::incompatible("component index exceeds component count"))?;

        *target = component;
        Ok(())
    }

    /// The number of pixels of the image.
    pub fn image_size(&self) -> Vec2<usize> {
        Vec2(
            self.image_extent.x().saturating_sub(self.image_offset.x()),
            self.image_extent.y().saturating_sub(self.image_offset.y()),
        )
    }

    /// The number of samples of a component,
    /// `ceil(extent / sampling) - ceil(offset / sampling)` along each axis.
    pub fn component_size(&self, index: usize) -> Vec2<usize> {
        let sampling = self.components[index].sampling;
        let end = Vec2(
            ceil_div(self.image_extent.x(), sampling.x()),
            ceil_div(self.image_extent.y(), sampling.y()),
        );

        let start = Vec2(
            ceil_div(self.image_offset.x(), sampling.x()),
            ceil_div(self.image_offset.y(), sampling.y()),
        );

        Vec2(end.x().saturating_sub(start.x()), end.y().saturating_sub(start.y()))
    }

    /// Check that the geometry can be encoded.
    pub fn validate(&self) -> UnitResult {
        if self.components.is_empty() {
            return Err(Error::unsupported("codestream without components"));
        }

        if self.image_extent.x() < self.image_offset.x() || self.image_extent.y() < self.image_offset.y() {
            return Err(Error::invalid("image extent before image offset"));
        }

        if self.tile_offset.x() > self.image_offset.x() || self.tile_offset.y() > self.image_offset.y() {
            return Err(Error::invalid("tile offset after image offset"));
        }

        if self.tile_offset.x().saturating_add(self.tile_size.x()) < self.image_extent.x()
            || self.tile_offset.y().saturating_add(self.tile_size.y()) < self.image_extent.y()
        {
            return Err(Error::unsupported("codestream with more than one tile"));
        }

        for component in &self.components {
            if component.sampling.x() == 0 || component.sampling.y() == 0 {
                return Err(Error::invalid("zero component sampling"));
            }

            if component.bit_depth == 0 || component.bit_depth > 32 {
                return Err(Error::unsupported("component bit depth outside of 1 to 32"));
            }
        }

        Ok(())
    }
}

impl CodingParameters {

    /// Check that the options can be encoded.
    pub fn validate(&self) -> UnitResult {
        let is_valid_block_length = |length: usize| length.is_power_of_two() && (4 ..= 1024).contains(&length);

        if !is_valid_block_length(self.block_size.x()) || !is_valid_block_length(self.block_size.y()) {
            return Err(Error::unsupported("code block dimension not a power of two between 4 and 1024"));
        }

        if self.block_size.area() > 4096 {
            return Err(Error::unsupported("code block with more than 4096 samples"));
        }

        if self.decomposition_levels > 32 {
            return Err(Error::unsupported("more than 32 decomposition levels"));
        }

        Ok(())
    }
}


/// The order in which the lines of all components are exchanged or pulled.
/// Yields the component index and the row within that component.
#[derive(Debug, Clone)]
pub struct LineSchedule {
    component_sizes: SmallVec<[Vec2<usize>; 5]>,
    component_sampling_y: SmallVec<[usize; 5]>,
    rows_done: SmallVec<[usize; 5]>,
    planar: bool,

    /// Current row of the reference grid, only used when interleaved.
    grid_row: usize,
    grid_end: usize,

    /// Current component to look at.
    component: usize,
}

impl LineSchedule {

    /// Iterate over all lines of all components of the specified geometry.
    pub fn new(siz: &SizeParameters, planar: bool) -> Self {
        let count = siz.components.len();

        LineSchedule {
            component_sizes: (0 .. count).map(|index| siz.component_size(index)).collect(),
            component_sampling_y: siz.components.iter().map(|component| component.sampling.y()).collect(),
            rows_done: smallvec![0; count],
            grid_row: siz.image_offset.y(),
            grid_end: siz.image_extent.y(),
            component: 0,
            planar,
        }
    }

    /// The total number of lines of all components.
    pub fn line_count(&self) -> usize {
        self.component_sizes.iter().map(|size| size.height()).sum()
    }

    /// Whether every line has been visited.
    pub fn is_complete(&self) -> bool {
        self.rows_done.iter().zip(&self.component_sizes)
            .all(|(&done, size)| done == size.height())
    }
}

impl Iterator for LineSchedule {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let count = self.component_sizes.len();

        if self.planar {
            while self.component < count {
                let component = self.component;
                let row = self.rows_done[component];

                if row < self.component_sizes[component].height() {
                    self.rows_done[component] += 1;
                    return Some((component, row));
                }

                self.component += 1;
            }

            None
        }

        else {
            while self.grid_row < self.grid_end {
                while self.component < count {
                    let component = self.component;
                    self.component += 1;

                    let row = self.rows_done[component];
                    let has_sample_in_row = self.grid_row % self.component_sampling_y[component] == 0;

                    if has_sample_in_row && row < self.component_sizes[component].height() {
                        self.rows_done[component] += 1;
                        return Some((component, row));
                    }
                }

                self.component = 0;
                self.grid_row += 1;
            }

            None
        }
    }
}
