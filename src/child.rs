/// The scrollable surface wrapped by the controller.
///
/// Positions are in the same coordinate space as the pointer events.
pub trait ScrollChild {
    /// Whether the child can still scroll its content toward the top.
    fn can_scroll_toward_top(&self) -> bool;

    /// Top edge of the first visible item, or `None` if the child shows no items.
    fn first_item_top(&self) -> Option<f64>;

    /// Whether `position` lies within the item area of the child.
    fn is_within_items(&self, position: f64) -> bool {
        self.first_item_top().is_some_and(|top| position >= top)
    }
}

impl<T: ScrollChild + ?Sized> ScrollChild for &T {
    fn can_scroll_toward_top(&self) -> bool {
        (**self).can_scroll_toward_top()
    }

    fn first_item_top(&self) -> Option<f64> {
        (**self).first_item_top()
    }

    fn is_within_items(&self, position: f64) -> bool {
        (**self).is_within_items(position)
    }
}

impl<T: ScrollChild + ?Sized> ScrollChild for Box<T> {
    fn can_scroll_toward_top(&self) -> bool {
        (**self).can_scroll_toward_top()
    }

    fn first_item_top(&self) -> Option<f64> {
        (**self).first_item_top()
    }

    fn is_within_items(&self, position: f64) -> bool {
        (**self).is_within_items(position)
    }
}
