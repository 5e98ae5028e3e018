use crate::error::{CodecError, Result};

/// Dimensionality of a dense grid handed to the transform backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridShape {
    /// One axis had size 1; the other two are kept in order.
    Planar { n1: usize, n2: usize },
    Volume { nx: usize, ny: usize, nz: usize },
}

// `infer` rejects empty axes, so an `is_empty` would always be false.
#[allow(clippy::len_without_is_empty)]
impl GridShape {
    /// Infer the shape from three axis sizes.
    ///
    /// Any unit axis makes the grid planar. Two or more unit axes describe a
    /// line, which the backend does not support, and neither does an empty
    /// axis.
    pub fn infer(nx: usize, ny: usize, nz: usize) -> Result<Self> {
        let unsupported = CodecError::UnsupportedShape { nx, ny, nz };
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(unsupported);
        }
        let units = [nx, ny, nz].iter().filter(|&&n| n == 1).count();
        match units {
            0 => Ok(GridShape::Volume { nx, ny, nz }),
            1 => {
                let n1 = if nx != 1 { nx } else { ny };
                let n2 = if nx != 1 && ny != 1 { ny } else { nz };
                Ok(GridShape::Planar { n1, n2 })
            }
            _ => Err(unsupported),
        }
    }

    /// Number of values a grid of this shape holds.
    pub fn len(&self) -> usize {
        match *self {
            GridShape::Planar { n1, n2 } => n1 * n2,
            GridShape::Volume { nx, ny, nz } => nx * ny * nz,
        }
    }

    /// Error unless `values` matches this shape exactly.
    pub fn check_len(&self, values: usize) -> Result<()> {
        if values != self.len() {
            return Err(CodecError::Backend {
                backend: "grid",
                message: format!("{values} values for a grid of {}", self.len()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_when_no_unit_axis() {
        assert_eq!(
            GridShape::infer(4, 5, 6).unwrap(),
            GridShape::Volume { nx: 4, ny: 5, nz: 6 }
        );
    }

    #[test]
    fn planar_keeps_axis_order() {
        assert_eq!(
            GridShape::infer(1, 5, 6).unwrap(),
            GridShape::Planar { n1: 5, n2: 6 }
        );
        assert_eq!(
            GridShape::infer(4, 1, 6).unwrap(),
            GridShape::Planar { n1: 4, n2: 6 }
        );
        assert_eq!(
            GridShape::infer(4, 5, 1).unwrap(),
            GridShape::Planar { n1: 4, n2: 5 }
        );
    }

    #[test]
    fn lines_and_empty_axes_rejected() {
        for (x, y, z) in [(1, 1, 8), (8, 1, 1), (1, 8, 1), (1, 1, 1), (0, 4, 4)] {
            assert!(matches!(
                GridShape::infer(x, y, z),
                Err(CodecError::UnsupportedShape { .. })
            ));
        }
    }

    #[test]
    fn length_check() {
        let shape = GridShape::infer(2, 3, 1).unwrap();
        assert_eq!(shape.len(), 6);
        assert!(shape.check_len(6).is_ok());
        assert!(shape.check_len(5).is_err());
    }
}
