
//! Property based particle storage.
//!
//! Particle attributes live in index aligned arrays, one array per registered
//! property type. Solver stages fetch only the slices they touch through a
//! [`Processor`], leaving the remaining properties alone.

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use mopa;

/// A typed particle attribute.
///
/// The implementing type is only a tag; the per-particle payload is
/// `Subtype`, stored contiguously for the whole system.
pub trait Property: 'static {
    type Subtype: Clone + Send + Sync + 'static;
    /// Default payload for particles added without an explicit value.
    fn new() -> Self::Subtype;
}

pub struct Particles {
    num_particles: usize,
    properties: HashMap<TypeId, Box<Storage>>,
}

impl Particles {
    pub fn new() -> Self {
        Particles {
            num_particles: 0,
            properties: HashMap::new(),
        }
    }

    /// Register a property; existing particles receive the default payload.
    pub fn add_property<T: Property>(&mut self) {
        let num_particles = self.num_particles;
        self.properties
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(VecStorage::<T>(vec![T::new(); num_particles], PhantomData)));
    }

    pub fn read_property<T: Property>(&self) -> Option<&[T::Subtype]> {
        self.properties
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.downcast_ref::<VecStorage<T>>())
            .map(|storage| storage.0.as_slice())
    }

    pub fn write_property<T: Property>(&mut self) -> Option<&mut [T::Subtype]> {
        self.properties
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.downcast_mut::<VecStorage<T>>())
            .map(|storage| storage.0.as_mut_slice())
    }

    pub fn reserve(&mut self, additional: usize) {
        for (_, property) in &mut self.properties {
            property.reserve(additional);
        }
    }

    /// Grow the system by `additional` particles and hand out a [`Builder`]
    /// for supplying their initial payloads batch by batch.
    pub fn add_particles(&mut self, additional: usize) -> Builder {
        self.reserve(additional);
        self.num_particles += additional;
        Builder(self)
    }

    /// Run a solver stage against this system.
    pub fn run<F>(&mut self, func: F) -> &mut Self
        where F: FnOnce(&Processor)
    {
        func(&Processor(self));
        self
    }

    /// Run a parameterized solver stage against this system.
    pub fn run1<F, A>(&mut self, func: F, args: A) -> &mut Self
        where F: FnOnce(&Processor, A)
    {
        func(&Processor(self), args);
        self
    }

    pub fn num_particles(&self) -> usize {
        self.num_particles
    }
}

/// Batched particle insertion; properties not supplied explicitly are filled
/// with their default payload when the builder drops.
pub struct Builder<'a>(&'a mut Particles);

impl<'a> Builder<'a> {
    pub fn with<T: Property>(&mut self, values: &[T::Subtype]) -> &mut Self {
        let num_particles = self.0.num_particles;
        if let Some(storage) = self.0
            .properties
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.downcast_mut::<VecStorage<T>>())
        {
            debug_assert_eq!(values.len(), num_particles - storage.0.len());
            storage.0.extend_from_slice(values);
        }
        self
    }
}

impl<'a> Drop for Builder<'a> {
    fn drop(&mut self) {
        let num_particles = self.0.num_particles;
        for (_, property) in &mut self.0.properties {
            let remaining = num_particles - property.len();
            if remaining > 0 {
                property.fill(remaining);
            }
        }
    }
}

/// Borrow window a stage works through.
///
/// Stages may fetch several distinct properties at once; fetching the same
/// property twice within one stage aliases its storage and is the stage's
/// responsibility to avoid.
pub struct Processor<'a>(&'a mut Particles);

impl<'a> Processor<'a> {
    pub fn read_property<T: Property>(&self) -> Option<&[T::Subtype]> {
        self.0.read_property::<T>()
    }

    pub fn write_property<T: Property>(&self) -> Option<&mut [T::Subtype]> {
        unsafe { self.fetch_mut::<T>() }
    }

    pub fn num_particles(&self) -> usize {
        self.0.num_particles
    }

    // Distinct property types live in disjoint storages; a stage must not
    // fetch the same property twice.
    #[allow(invalid_reference_casting)]
    unsafe fn fetch_mut<T: Property>(&self) -> Option<&mut [T::Subtype]> {
        self.0
            .properties
            .get(&TypeId::of::<T>())
            .and_then(|storage| {
                let storage = &mut *(storage.as_ref() as *const Storage as *mut Storage);
                storage.downcast_mut::<VecStorage<T>>()
            })
            .map(|storage| storage.0.as_mut_slice())
    }
}

trait Storage: mopa::Any {
    fn len(&self) -> usize;
    fn reserve(&mut self, additional: usize);
    fn fill(&mut self, additional: usize);
}

mopafy!(Storage);

struct VecStorage<T: Property>(Vec<T::Subtype>, PhantomData<T>);

impl<T: Property> Storage for VecStorage<T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.0.reserve(additional);
    }

    fn fill(&mut self, additional: usize) {
        let default = T::new();
        for _ in 0..additional {
            self.0.push(default.clone());
        }
    }
}
