//! Address-ordered free list with coalescing.
//!
//! Backs the first-fit, best-fit and general-purpose strategies.

/// A free byte range `[address, address + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region {
    pub address: usize,
    pub size: usize,
}

impl Region {
    pub fn end(&self) -> usize {
        self.address + self.size
    }
}

/// Free regions sorted by address; adjacent regions are always merged.
#[derive(Debug, Clone)]
pub(crate) struct FreeRegions {
    regions: Vec<Region>,
}

impl FreeRegions {
    /// One free region spanning `[0, capacity)`.
    pub fn spanning(capacity: usize) -> Self {
        let mut regions = Vec::new();
        if capacity > 0 {
            regions.push(Region {
                address: 0,
                size: capacity,
            });
        }
        Self { regions }
    }

    /// Index of the first region (lowest address) holding `size` bytes.
    pub fn first_fit(&self, size: usize) -> Option<usize> {
        self.regions.iter().position(|r| r.size >= size)
    }

    /// Index of the smallest region holding `size` bytes.
    ///
    /// Linear scan over every free region; ties go to the lower address.
    pub fn best_fit(&self, size: usize) -> Option<usize> {
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.size >= size)
            .min_by_key(|(_, r)| r.size)
            .map(|(i, _)| i)
    }

    /// Take `size` bytes from the front of region `index`.
    ///
    /// The remainder, if any, stays in place as a smaller free region.
    pub fn carve(&mut self, index: usize, size: usize) -> usize {
        let region = &mut self.regions[index];
        debug_assert!(region.size >= size);

        let address = region.address;
        if region.size == size {
            self.regions.remove(index);
        } else {
            region.address += size;
            region.size -= size;
        }
        address
    }

    /// Return `[address, address + size)` and merge it with its neighbours.
    pub fn release(&mut self, address: usize, size: usize) {
        let index = self.regions.partition_point(|r| r.address < address);
        self.regions.insert(index, Region { address, size });

        // Successor first so `index` stays valid.
        if index + 1 < self.regions.len() && self.regions[index].end() == self.regions[index + 1].address {
            let next = self.regions.remove(index + 1);
            self.regions[index].size += next.size;
        }
        if index > 0 && self.regions[index - 1].end() == self.regions[index].address {
            let current = self.regions.remove(index);
            self.regions[index - 1].size += current.size;
        }
    }

    pub fn total(&self) -> usize {
        self.regions.iter().map(|r| r.size).sum()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter()
    }
}
