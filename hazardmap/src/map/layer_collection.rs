use std::ops::{Index, IndexMut};

use crate::layer::Layer;

/// Collection of layers with some meta-information.
///
/// When a map is rendered, it draws all visible layers in the order they are stored in the
/// collection. Any layer can be temporary hidden with the [`LayerCollection::hide`] or
/// [`LayerCollection::set_visible_by_name`] methods. These layers will be ignored by the
/// renderer, but retain their place in the collection.
///
/// Layer names are not unique. Every operation taking a name applies to all layers with this
/// name, so a dataset loaded twice is shown, hidden and removed as one.
#[derive(Default)]
pub struct LayerCollection(Vec<LayerEntry>);

struct LayerEntry {
    layer: Box<dyn Layer>,
    is_hidden: bool,
}

impl LayerCollection {
    /// Removes all layers from the collection.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Inserts a layer at position `index`, shifting all layers after it to the right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`
    pub fn insert(&mut self, index: usize, layer: Box<dyn Layer>) {
        self.0.insert(index, LayerEntry::new(layer));
    }

    /// Removes a layer at `index`, shifting all layers after it to the left and returning the
    /// removed layer.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> Box<dyn Layer> {
        self.0.remove(index).layer
    }

    /// Retains only the layers specified by the predicate. In other words, remove all layers `l`
    /// for which f(&l) returns false.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&dyn Layer) -> bool,
    {
        self.0.retain(|entry| f(&*entry.layer))
    }

    /// Adds the layer to the end of the collection.
    pub fn push(&mut self, layer: Box<dyn Layer>) {
        self.0.push(LayerEntry::new(layer))
    }

    /// Removes every layer with the given name. Returns the number of removed layers.
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let before = self.0.len();
        self.0.retain(|entry| entry.layer.name() != name);
        before - self.0.len()
    }

    /// Replaces all layers named as `layer` with it.
    ///
    /// The new layer takes the place of the first removed one, so the drawing order of the
    /// dataset is kept. If there was no layer with this name, the layer is added to the end.
    /// The new layer takes the visibility of the replaced one.
    pub fn replace_by_name(&mut self, layer: Box<dyn Layer>) {
        let position = self
            .0
            .iter()
            .position(|entry| entry.layer.name() == layer.name());

        match position {
            Some(position) => {
                let is_hidden = self.0[position].is_hidden;
                let name = layer.name().to_string();
                self.remove_by_name(&name);
                self.0.insert(position, LayerEntry { layer, is_hidden });
            }
            None => self.push(layer),
        }
    }

    /// Sets visibility of every layer with the given name. Returns the number of affected
    /// layers.
    pub fn set_visible_by_name(&mut self, name: &str, is_visible: bool) -> usize {
        let mut count = 0;
        for entry in self.0.iter_mut().filter(|entry| entry.layer.name() == name) {
            entry.is_hidden = !is_visible;
            count += 1;
        }

        count
    }

    /// Number of layers with the given name.
    pub fn count_named(&self, name: &str) -> usize {
        self.iter().filter(|layer| layer.name() == name).count()
    }

    /// Returns the count of layers in the collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the collection contains zero layers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a layer at `index`, or `None` if index is out of bounds.
    pub fn get(&self, index: usize) -> Option<&dyn Layer> {
        self.0.get(index).map(|entry| &*entry.layer)
    }

    /// Returns a mutable reference to a layer at `index`, or `None` if index is out of bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn Layer>> {
        self.0.get_mut(index).map(|entry| &mut entry.layer)
    }

    /// Iterates over all layers in the collection.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Layer> + '_ {
        self.0.iter().map(|entry| &*entry.layer)
    }

    /// Sets the layer at `index` as invisible. The hidden layer can be later shown with
    /// [`LayerCollection::show`].
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn hide(&mut self, index: usize) {
        self.0[index].is_hidden = true;
    }

    /// Sets the layer at `index` as visible.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn show(&mut self, index: usize) {
        self.0[index].is_hidden = false;
    }

    /// Sets all layers for which the predicate returns true as visible. The rest of layers are set
    /// as hidden.
    pub fn show_by<F>(&mut self, mut f: F)
    where
        F: FnMut(&dyn Layer) -> bool,
    {
        for entry in &mut self.0 {
            entry.is_hidden = !f(&*entry.layer);
        }
    }

    /// Sets visibility of every layer for which `f` returns a value. Layers for which it returns
    /// `None` keep their visibility. Returns the number of affected layers.
    pub fn update_visibility<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&dyn Layer) -> Option<bool>,
    {
        let mut count = 0;
        for entry in &mut self.0 {
            if let Some(is_visible) = f(&*entry.layer) {
                entry.is_hidden = !is_visible;
                count += 1;
            }
        }

        count
    }

    /// Returns true, if the layer at `index` is not hidden.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn is_visible(&self, index: usize) -> bool {
        !self.0[index].is_hidden
    }

    /// Iterates over all visible layers in the collection.
    pub fn iter_visible(&self) -> impl Iterator<Item = &dyn Layer> + '_ {
        self.0
            .iter()
            .filter(|entry| !entry.is_hidden)
            .map(|entry| &*entry.layer)
    }
}

impl std::fmt::Debug for LayerCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.0
                    .iter()
                    .map(|entry| (entry.layer.name(), !entry.is_hidden)),
            )
            .finish()
    }
}

impl Index<usize> for LayerCollection {
    type Output = dyn Layer;

    fn index(&self, index: usize) -> &Self::Output {
        &*self.0[index].layer
    }
}

impl IndexMut<usize> for LayerCollection {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut *self.0[index].layer
    }
}

impl FromIterator<Box<dyn Layer>> for LayerCollection {
    fn from_iter<T: IntoIterator<Item = Box<dyn Layer>>>(iter: T) -> Self {
        Self(iter.into_iter().map(LayerEntry::new).collect())
    }
}

impl LayerEntry {
    fn new(layer: Box<dyn Layer>) -> Self {
        Self {
            layer,
            is_hidden: false,
        }
    }
}
