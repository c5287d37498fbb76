//! Point-sampled ground height queries.

/// A surface that can report its ground height under a world (x, z) position.
///
/// Implementations are read-only and must return `0.0` for positions outside
/// their footprint so per-frame collision never has to handle an error.
pub trait HeightSampler {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32;
}

impl<T: HeightSampler + ?Sized> HeightSampler for &T {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        (**self).height_at(world_x, world_z)
    }
}

impl<T: HeightSampler + ?Sized> HeightSampler for Box<T> {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        (**self).height_at(world_x, world_z)
    }
}

/// Infinite flat ground at a fixed height.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatGround(pub f32);

impl HeightSampler for FlatGround {
    fn height_at(&self, _world_x: f32, _world_z: f32) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_ground_through_box_and_ref() {
        let boxed: Box<dyn HeightSampler> = Box::new(FlatGround(2.5));
        assert_eq!(boxed.height_at(100.0, -3.0), 2.5);
        let by_ref = &FlatGround(-1.0);
        assert_eq!(by_ref.height_at(0.0, 0.0), -1.0);
    }
}
