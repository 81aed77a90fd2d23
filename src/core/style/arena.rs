//! Style arena with owned/borrowed handles
//!
//! Computed styles live in slots of a [`StyleArena`]. A [`StyleHandle`] records whether
//! its holder owns the slot (and must release it) or merely aliases a slot owned
//! further up the tree. Handles are neither `Copy` nor `Clone`: the only way to get a
//! second handle to a slot is [`StyleHandle::borrow`], which never owns, so a slot is
//! released at most once.

use super::cascade::{inherited_part, merge_with_policy, ImportantPolicy};
use super::ComputedStyle;
use crate::utils::error::{ConversionError, ConversionResult};
use std::borrow::Cow;

/// Reference to a style slot
#[derive(Debug, PartialEq, Eq)]
pub struct StyleHandle {
    index: usize,
    owned: bool,
}

impl StyleHandle {
    /// A non-owning alias of the same slot
    pub fn borrow(&self) -> StyleHandle {
        StyleHandle {
            index: self.index,
            owned: false,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Slot storage for computed styles.
///
/// Slot 0 holds the empty root style and is never released.
#[derive(Debug)]
pub struct StyleArena {
    slots: Vec<Option<ComputedStyle>>,
    free: Vec<usize>,
    allocations: usize,
    releases: usize,
}

impl StyleArena {
    pub fn new() -> Self {
        Self {
            slots: vec![Some(ComputedStyle::new())],
            free: Vec::new(),
            allocations: 0,
            releases: 0,
        }
    }

    /// Borrowed handle to the empty root style
    pub fn root(&self) -> StyleHandle {
        StyleHandle {
            index: 0,
            owned: false,
        }
    }

    pub fn get(&self, handle: &StyleHandle) -> ConversionResult<&ComputedStyle> {
        self.slots
            .get(handle.index)
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                ConversionError::internal(format!("style slot {} is not live", handle.index))
            })
    }

    /// Store a style and return an owning handle
    pub fn alloc(&mut self, style: ComputedStyle) -> ConversionResult<StyleHandle> {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(style);
                index
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(Some(style));
                self.slots.len() - 1
            }
        };
        self.allocations += 1;
        Ok(StyleHandle { index, owned: true })
    }

    /// Owning copy of the style behind `handle`
    pub fn duplicate(&mut self, handle: &StyleHandle) -> ConversionResult<StyleHandle> {
        let copy = self.get(handle)?.clone();
        self.alloc(copy)
    }

    /// Resolve `overlay` against the style behind `base`.
    ///
    /// An empty overlay yields a borrowed alias of `base`; anything else allocates.
    pub fn merge(
        &mut self,
        base: &StyleHandle,
        overlay: &ComputedStyle,
        policy: ImportantPolicy,
    ) -> ConversionResult<StyleHandle> {
        if overlay.is_empty() {
            return Ok(base.borrow());
        }
        let merged = merge_with_policy(self.get(base)?, overlay, policy)?.into_owned();
        self.alloc(merged)
    }

    /// The style children of `handle`'s node start from.
    ///
    /// Aliases `handle` unless it carries non-inheritable properties.
    pub fn inherited(&mut self, handle: &StyleHandle) -> ConversionResult<StyleHandle> {
        let filtered = match inherited_part(self.get(handle)?)? {
            Cow::Borrowed(_) => None,
            Cow::Owned(style) => Some(style),
        };
        match filtered {
            None => Ok(handle.borrow()),
            Some(style) => self.alloc(style),
        }
    }

    /// Give a handle back. Borrowed handles are a no-op.
    pub fn release(&mut self, handle: StyleHandle) -> ConversionResult<()> {
        if !handle.owned {
            return Ok(());
        }
        if handle.index == 0 {
            return Err(ConversionError::internal("attempt to release the root style"));
        }
        match self.slots.get_mut(handle.index).and_then(Option::take) {
            Some(_) => {
                self.free.push(handle.index);
                self.releases += 1;
                Ok(())
            }
            None => Err(ConversionError::internal(format!(
                "style slot {} released twice",
                handle.index
            ))),
        }
    }

    /// Owned slots currently alive
    pub fn live(&self) -> usize {
        self.allocations - self.releases
    }

    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn releases(&self) -> usize {
        self.releases
    }
}

impl Default for StyleArena {
    fn default() -> Self {
        Self::new()
    }
}
