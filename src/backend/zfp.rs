//! Fixed-accuracy ZFP coding of dense `f64` grids.
//!
//! The compressed buffer starts with a full ZFP header, so decompression
//! only needs the grid shape to size its output.

use std::ffi::c_void;
use std::ptr;

use tracing::debug;
use zfp_sys::{
    stream_close, stream_open, zfp_compress, zfp_decompress, zfp_field, zfp_field_2d,
    zfp_field_3d, zfp_field_free, zfp_field_size, zfp_field_type, zfp_read_header, zfp_stream,
    zfp_stream_close, zfp_stream_maximum_size, zfp_stream_open, zfp_stream_rewind,
    zfp_stream_set_accuracy, zfp_stream_set_bit_stream, zfp_type_zfp_type_double,
    zfp_write_header, ZFP_HEADER_FULL,
};

use super::GridShape;
use crate::error::{CodecError, Result};

const BACKEND: &str = "zfp";

fn failure(message: &str) -> CodecError {
    CodecError::Backend {
        backend: BACKEND,
        message: message.to_string(),
    }
}

/// Owns the raw ZFP handles for one call and releases them on drop.
struct Session {
    field: *mut zfp_field,
    zfp: *mut zfp_stream,
    stream: *mut zfp_sys::bitstream,
}

impl Session {
    /// # Safety
    /// `values` must hold `shape.len()` doubles and outlive the session.
    unsafe fn open(values: *mut f64, shape: GridShape) -> Result<Self> {
        let field = match shape {
            GridShape::Planar { n1, n2 } => {
                zfp_field_2d(values as *mut c_void, zfp_type_zfp_type_double, n1 as _, n2 as _)
            }
            GridShape::Volume { nx, ny, nz } => zfp_field_3d(
                values as *mut c_void,
                zfp_type_zfp_type_double,
                nx as _,
                ny as _,
                nz as _,
            ),
        };
        if field.is_null() {
            return Err(failure("could not allocate field"));
        }
        let zfp = zfp_stream_open(ptr::null_mut());
        if zfp.is_null() {
            zfp_field_free(field);
            return Err(failure("could not open stream"));
        }
        Ok(Self {
            field,
            zfp,
            stream: ptr::null_mut(),
        })
    }

    /// # Safety
    /// `buffer` must stay alive and unmoved for the rest of the session.
    unsafe fn attach(&mut self, buffer: &mut [u8]) -> Result<()> {
        let stream = stream_open(buffer.as_mut_ptr() as *mut c_void, buffer.len() as _);
        if stream.is_null() {
            return Err(failure("could not open bit stream"));
        }
        self.stream = stream;
        zfp_stream_set_bit_stream(self.zfp, stream);
        zfp_stream_rewind(self.zfp);
        Ok(())
    }

    /// Whether the field, as last set by a header read, is a `f64` grid of
    /// exactly `shape`.
    ///
    /// # Safety
    /// The session's field must be live.
    unsafe fn field_matches(&self, shape: GridShape) -> bool {
        let expected = match shape {
            GridShape::Planar { n1, n2 } => (n1, n2, 0),
            GridShape::Volume { nx, ny, nz } => (nx, ny, nz),
        };
        let field = &*self.field;
        let dims = (field.nx as usize, field.ny as usize, field.nz as usize);
        zfp_field_type(self.field) == zfp_type_zfp_type_double
            && dims == expected
            && zfp_field_size(self.field, ptr::null_mut()) as usize == shape.len()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        unsafe {
            zfp_field_free(self.field);
            zfp_stream_close(self.zfp);
            if !self.stream.is_null() {
                stream_close(self.stream);
            }
        }
    }
}

/// Compress `values` laid out as `shape` with absolute error `tolerance`.
pub fn compress_grid(values: &[f64], shape: GridShape, tolerance: f64) -> Result<Vec<u8>> {
    shape.check_len(values.len())?;
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        return Err(failure("tolerance must be finite and non-negative"));
    }
    // ZFP takes a mutable pointer even when only reading.
    let mut scratch = values.to_vec();
    unsafe {
        let mut session = Session::open(scratch.as_mut_ptr(), shape)?;
        zfp_stream_set_accuracy(session.zfp, tolerance);
        let capacity = zfp_stream_maximum_size(session.zfp, session.field) as usize;
        let mut buffer = vec![0u8; capacity];
        session.attach(&mut buffer)?;

        if zfp_write_header(session.zfp, session.field, ZFP_HEADER_FULL as _) == 0 {
            return Err(failure("could not write header"));
        }
        let size = zfp_compress(session.zfp, session.field) as usize;
        if size == 0 {
            return Err(failure("compression failed"));
        }
        drop(session);
        buffer.truncate(size);
        debug!(values = values.len(), bytes = size, tolerance, "zfp compressed grid");
        Ok(buffer)
    }
}

/// Rebuild a grid of `shape` from bytes written by [`compress_grid`].
///
/// The header in `bytes` must describe a `f64` grid of exactly `shape`.
pub fn decompress_grid(bytes: &[u8], shape: GridShape) -> Result<Vec<f64>> {
    let mut values = vec![0f64; shape.len()];
    let mut buffer = bytes.to_vec();
    unsafe {
        let mut session = Session::open(values.as_mut_ptr(), shape)?;
        session.attach(&mut buffer)?;
        if zfp_read_header(session.zfp, session.field, ZFP_HEADER_FULL as _) == 0 {
            return Err(failure("could not read header"));
        }
        if !session.field_matches(shape) {
            return Err(failure("header does not match the requested grid shape"));
        }
        if zfp_decompress(session.zfp, session.field) == 0 {
            return Err(failure("decompression failed"));
        }
    }
    debug!(values = values.len(), bytes = bytes.len(), "zfp decompressed grid");
    Ok(values)
}
