
//! A lossless codestream engine without external dependencies.
//! It shares the geometry and the line streaming model of JPEG 2000,
//! but replaces the wavelet and the block coder with
//! left-neighbour prediction and zlib.

mod format;
mod transform;

use smallvec::SmallVec;

use crate::compression::{ByteVec, Bytes};
use crate::error::{Error, Result, UnitResult};
use crate::io::{Data, Tracking};
use crate::math::Vec2;
use super::{CodestreamDecoder, CodestreamEncoder, CodingParameters, Line, LineMut, LineSchedule, SizeParameters};
use super::super::messages::{MessageHandler, MessageLevel};
use self::format::*;
use self::transform::*;


/// Compresses the lines of all components into a reference codestream.
pub struct ReferenceEncoder<'m> {
    messages: &'m dyn MessageHandler,
    siz: SizeParameters,
    cod: CodingParameters,
    planar: bool,

    /// Present after the headers have been written.
    output: Option<Tracking<ByteVec>>,
    lines: Option<Lines>,
    flushed: bool,
}

/// Compressed lines are buffered, because they are only compressed when flushing.
#[derive(Debug)]
struct Lines {
    schedule: LineSchedule,
    component_sizes: SmallVec<[Vec2<usize>; 5]>,
    planes: SmallVec<[Vec<i32>; 5]>,

    /// The line that has been handed out but not committed yet.
    current: Option<(usize, usize)>,
}

/// Decompresses the lines of all components from a reference codestream.
pub struct ReferenceDecoder<'d> {
    bytes: Bytes<'d>,
    messages: &'d dyn MessageHandler,
    siz: SizeParameters,
    cod: CodingParameters,
    planar: bool,

    /// The compressed sample data, present after the headers have been read.
    data: Option<Bytes<'d>>,
    lines: Option<DecodedLines>,
}

#[derive(Debug)]
struct DecodedLines {
    schedule: LineSchedule,
    component_sizes: SmallVec<[Vec2<usize>; 5]>,
    planes: SmallVec<[Vec<i32>; 5]>,
}


impl std::fmt::Debug for ReferenceEncoder<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("ReferenceEncoder")
            .field("siz", &self.siz).field("cod", &self.cod)
            .field("planar", &self.planar).field("flushed", &self.flushed)
            .finish()
    }
}

impl std::fmt::Debug for ReferenceDecoder<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("ReferenceDecoder")
            .field("byte_count", &self.bytes.len())
            .field("siz", &self.siz).field("cod", &self.cod)
            .field("planar", &self.planar)
            .finish()
    }
}


/// Whether the first three components can be decorrelated with the color transform.
fn validate_color_transform(siz: &SizeParameters) -> UnitResult {
    let components = &siz.components;

    let can_transform = components.len() >= 3
        && components[1].sampling == components[0].sampling
        && components[2].sampling == components[0].sampling;

    if !can_transform {
        return Err(Error::invalid("color transform requires three components of equal size"));
    }

    Ok(())
}

/// Number of samples stored in the codestream.
fn total_sample_count(component_sizes: &[Vec2<usize>]) -> Result<usize> {
    component_sizes.iter().try_fold(0_usize, |sum, size| {
        size.width().checked_mul(size.height())
            .and_then(|area| sum.checked_add(area))
            .ok_or_else(|| Error::invalid("codestream sample count too large"))
    })
}

/// Each sample occupies at least one byte of the inflated data,
/// and deflate cannot shrink data by more than this factor.
const MAX_DEFLATE_RATIO: usize = 1032;

/// Reject geometry that the compressed data cannot possibly contain,
/// before allocating any planes for it.
fn validate_sample_count(component_sizes: &[Vec2<usize>], compressed_byte_count: usize) -> Result<usize> {
    let sample_count = total_sample_count(component_sizes)?;

    if sample_count > compressed_byte_count.saturating_mul(MAX_DEFLATE_RATIO) {
        return Err(Error::invalid("codestream size exceeds its sample data"));
    }

    Ok(sample_count)
}

fn component_sizes(siz: &SizeParameters) -> SmallVec<[Vec2<usize>; 5]> {
    (0 .. siz.components.len()).map(|index| siz.component_size(index)).collect()
}


impl<'m> CodestreamEncoder<'m> for ReferenceEncoder<'m> {
    fn new(messages: &'m dyn MessageHandler) -> Self {
        ReferenceEncoder {
            messages,
            siz: SizeParameters::default(),
            cod: CodingParameters::default(),
            planar: false,
            output: None,
            lines: None,
            flushed: false,
        }
    }

    fn access_siz(&mut self) -> &mut SizeParameters { &mut self.siz }
    fn access_cod(&mut self) -> &mut CodingParameters { &mut self.cod }

    fn set_planar(&mut self, planar: bool) {
        if self.output.is_some() {
            self.messages.message(MessageLevel::Warning, "line order cannot change after the headers were written");
        }

        else {
            self.planar = planar;
        }
    }

    fn write_headers(&mut self, output: ByteVec) -> UnitResult {
        if self.output.is_some() {
            return Err(Error::incompatible("codestream headers written twice"));
        }

        self.siz.validate()?;
        self.cod.validate()?;

        if !self.cod.reversible {
            return Err(Error::unsupported("irreversible codestream transform"));
        }

        if self.cod.color_transform {
            validate_color_transform(&self.siz)?;

            if self.planar {
                return Err(Error::unsupported("color transform of planar components"));
            }
        }

        let mut output = Tracking::new(output);
        SOC.write(&mut output)?;
        write_size_segment(&mut output, &self.siz)?;
        write_coding_segment(&mut output, &self.cod)?;

        let component_sizes = component_sizes(&self.siz);
        total_sample_count(&component_sizes)?;

        self.lines = Some(Lines {
            schedule: LineSchedule::new(&self.siz, self.planar),
            planes: component_sizes.iter().map(|size| vec![0; size.area()]).collect(),
            component_sizes,
            current: None,
        });

        self.output = Some(output);
        Ok(())
    }

    fn exchange(&mut self, commit_previous: bool) -> Result<Option<LineMut<'_>>> {
        let lines = self.lines.as_mut()
            .ok_or_else(|| Error::incompatible("codestream lines exchanged before writing the headers"))?;

        let (component, row) = match lines.current {
            // hand out the same line again, it has not been filled yet
            Some(current) if !commit_previous => current,

            _ => {
                match lines.schedule.next() {
                    Some(next) => next,
                    None => {
                        lines.current = None;
                        return Ok(None);
                    }
                }
            }
        };

        lines.current = Some((component, row));

        let width = lines.component_sizes[component].width();
        let samples = &mut lines.planes[component][row * width .. (row + 1) * width];
        Ok(Some(LineMut { component, samples }))
    }

    fn flush(&mut self) -> UnitResult {
        let (output, lines) = match (self.output.as_mut(), self.lines.as_ref()) {
            (Some(output), Some(lines)) => (output, lines),
            _ => return Err(Error::incompatible("codestream flushed before writing the headers")),
        };

        if self.flushed {
            return Err(Error::incompatible("codestream flushed twice"));
        }

        if lines.current.is_some() || !lines.schedule.is_complete() {
            return Err(Error::incompatible("codestream flushed before all lines were committed"));
        }

        let planes = &lines.planes;
        let color_transform = self.cod.color_transform;

        let sample = |component: usize, index: usize| -> i64 {
            if color_transform && component < 3 {
                let (luma, blue_difference, red_difference) = forward_color_transform(
                    i64::from(planes[0][index]), i64::from(planes[1][index]), i64::from(planes[2][index])
                );

                [luma, blue_difference, red_difference][component]
            }

            else {
                i64::from(planes[component][index])
            }
        };

        let mut samples = Vec::with_capacity(total_sample_count(&lines.component_sizes)?.saturating_mul(2));

        for (component, size) in lines.component_sizes.iter().enumerate() {
            for row in 0 .. size.height() {
                let start = row * size.width();
                write_line_differences(&mut samples, (start .. start + size.width()).map(|index| sample(component, index)));
            }
        }

        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&samples, 4);
        write_data_segment(output, &compressed)?;
        EOC.write(output)?;

        self.flushed = true;
        Ok(())
    }

    fn tell(&self) -> usize {
        self.output.as_ref().map_or(0, Tracking::byte_position)
    }

    fn into_output(self) -> ByteVec {
        self.output.map(Tracking::into_inner).unwrap_or_default()
    }
}


impl<'d> ReferenceDecoder<'d> {
    fn decompress_planes(&self, data: Bytes<'d>, component_sizes: &[Vec2<usize>]) -> Result<SmallVec<[Vec<i32>; 5]>> {
        // every sample occupies at most ten bytes
        let sample_count = validate_sample_count(component_sizes, data.len())?;
        let limit = sample_count.saturating_mul(10);

        let options = zune_inflate::DeflateOptions::default()
            .set_limit(limit).set_size_hint(sample_count.saturating_mul(2));

        let samples = zune_inflate::DeflateDecoder::new_with_options(data, options)
            .decode_zlib().map_err(|_| Error::invalid("zlib-compressed codestream malformed"))?;

        let mut read = samples.as_slice();
        let mut planes: SmallVec<[Vec<i64>; 5]> = component_sizes.iter()
            .map(|size| vec![0; size.area()]).collect();

        for (plane, size) in planes.iter_mut().zip(component_sizes) {
            if size.width() == 0 { continue; }

            for line in plane.chunks_exact_mut(size.width()) {
                read_line_differences(&mut read, line)?;
            }
        }

        if !read.is_empty() {
            self.messages.message(MessageLevel::Warning, "ignoring trailing codestream sample data");
        }

        if self.cod.color_transform {
            let (first, rest) = planes.split_at_mut(1);
            let (second, rest) = rest.split_at_mut(1);

            for ((first, second), third) in first[0].iter_mut().zip(second[0].iter_mut()).zip(rest[0].iter_mut()) {
                let (red, green, blue) = inverse_color_transform(*first, *second, *third);
                *first = red;
                *second = green;
                *third = blue;
            }
        }

        planes.into_iter()
            .map(|plane| plane.into_iter()
                .map(|sample| i32::try_from(sample).map_err(|_| Error::invalid("codestream sample out of range")))
                .collect::<Result<Vec<i32>>>()
            )
            .collect()
    }
}

impl<'d> CodestreamDecoder<'d> for ReferenceDecoder<'d> {
    fn from_bytes(bytes: Bytes<'d>, messages: &'d dyn MessageHandler) -> Self {
        ReferenceDecoder {
            bytes, messages,
            siz: SizeParameters::default(),
            cod: CodingParameters::default(),
            planar: false,
            data: None,
            lines: None,
        }
    }

    fn read_headers(&mut self) -> UnitResult {
        let mut read = self.bytes;

        if u16::read(&mut read)? != SOC {
            return Err(Error::invalid("codestream start marker"));
        }

        let mut siz = None;
        let mut cod = None;
        let mut data = None;

        loop {
            match u16::read(&mut read)? {
                SIZ => siz = Some(read_size_segment(&mut read)?),
                COD => cod = Some(read_coding_segment(&mut read)?),
                SOD => data = Some(read_data_segment(&mut read)?),
                EOC => break,

                marker if marker >> 8 == 0xFF => {
                    self.messages.message(MessageLevel::Warning, &format!("skipping unknown codestream segment {:#06X}", marker));
                    skip_segment(&mut read)?;
                },

                _ => return Err(Error::invalid("codestream marker")),
            }
        }

        if !read.is_empty() {
            self.messages.message(MessageLevel::Warning, "ignoring bytes after the end of the codestream");
        }

        let (siz, cod, data) = match (siz, cod, data) {
            (Some(siz), Some(cod), Some(data)) => (siz, cod, data),
            _ => return Err(Error::invalid("codestream segment missing")),
        };

        siz.validate()?;
        validate_sample_count(&component_sizes(&siz), data.len())?;

        if cod.color_transform {
            validate_color_transform(&siz)?;
        }

        self.siz = siz;
        self.cod = cod;
        self.data = Some(data);
        Ok(())
    }

    fn siz(&self) -> &SizeParameters { &self.siz }
    fn cod(&self) -> &CodingParameters { &self.cod }

    fn set_planar(&mut self, planar: bool) {
        self.planar = planar;
    }

    fn create(&mut self) -> UnitResult {
        let data = self.data.ok_or_else(|| Error::incompatible("codestream created before reading the headers"))?;

        if self.lines.is_some() {
            return Err(Error::incompatible("codestream created twice"));
        }

        if !self.cod.reversible {
            return Err(Error::unsupported("irreversible codestream transform"));
        }

        let component_sizes = component_sizes(&self.siz);
        let planes = self.decompress_planes(data, &component_sizes)?;

        self.lines = Some(DecodedLines {
            schedule: LineSchedule::new(&self.siz, self.planar),
            component_sizes,
            planes,
        });

        Ok(())
    }

    fn pull(&mut self) -> Result<Line<'_>> {
        let lines = self.lines.as_mut()
            .ok_or_else(|| Error::incompatible("codestream lines pulled before creating the decoder"))?;

        let (component, row) = lines.schedule.next()
            .ok_or_else(|| Error::incompatible("codestream lines pulled after the last line"))?;

        let width = lines.component_sizes[component].width();
        let samples = &lines.planes[component][row * width .. (row + 1) * width];
        Ok(Line { component, samples })
    }
}
