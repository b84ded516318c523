/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

/// Smallest backing capacity a queue is created with.
const MIN_CAPACITY: usize = 64;

/// Growable ring-buffer FIFO backing the mailbox pump.
///
/// Capacity is always a power of two so indices wrap with a mask. When full,
/// the buffer doubles and rewrites itself to a contiguous head-at-zero
/// layout. It never shrinks.
pub(crate) struct RingQueue<T> {
    buf: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RingQueue<T> {
    /// Creates a queue with room for at least `capacity` elements before the
    /// first growth.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.max(MIN_CAPACITY).next_power_of_two();
        let mut buf = Vec::new();
        buf.resize_with(cap, || None);
        RingQueue { buf, head: 0, len: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn mask(&self) -> usize {
        self.buf.len() - 1
    }

    /// Appends `value`, growing the buffer if it is full.
    pub(crate) fn push_back(&mut self, value: T) {
        if self.len == self.buf.len() {
            self.grow();
        }
        let idx = (self.head + self.len) & self.mask();
        self.buf[idx] = Some(value);
        self.len += 1;
    }

    /// The element at the head of the queue, if any.
    #[allow(dead_code)]
    pub(crate) fn front(&self) -> Option<&T> {
        if self.len == 0 {
            None
        } else {
            self.buf[self.head].as_ref()
        }
    }

    /// Removes and returns the element at the head of the queue.
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.buf[self.head].take();
        self.head = (self.head + 1) & self.mask();
        self.len -= 1;
        value
    }

    fn grow(&mut self) {
        let old_cap = self.buf.len();
        let mut new_buf: Vec<Option<T>> = Vec::new();
        new_buf.resize_with(old_cap * 2, || None);
        for i in 0..self.len {
            new_buf[i] = self.buf[(self.head + i) & (old_cap - 1)].take();
        }
        self.buf = new_buf;
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_minimum_power_of_two_capacity() {
        let queue: RingQueue<u32> = RingQueue::with_capacity(0);
        assert_eq!(queue.capacity(), 64);

        let queue: RingQueue<u32> = RingQueue::with_capacity(65);
        assert_eq!(queue.capacity(), 128);

        let queue: RingQueue<u32> = RingQueue::with_capacity(256);
        assert_eq!(queue.capacity(), 256);
    }

    #[test]
    fn push_then_pop_returns_value() {
        let mut queue = RingQueue::with_capacity(0);
        queue.push_back(7);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.front(), Some(&7));
        assert_eq!(queue.pop_front(), Some(7));
        assert!(queue.is_empty());
        assert_eq!(queue.pop_front(), None);
    }

    #[test]
    fn preserves_fifo_order_across_growth() {
        let mut queue = RingQueue::with_capacity(0);
        for i in 0..1_000 {
            queue.push_back(i);
        }
        assert_eq!(queue.len(), 1_000);
        assert_eq!(queue.capacity(), 1_024);
        for i in 0..1_000 {
            assert_eq!(queue.pop_front(), Some(i));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn wraps_around_the_backing_buffer() {
        let mut queue = RingQueue::with_capacity(0);
        // Advance the head so subsequent pushes wrap past the end.
        for i in 0..48 {
            queue.push_back(i);
        }
        for i in 0..48 {
            assert_eq!(queue.pop_front(), Some(i));
        }
        for i in 0..64 {
            queue.push_back(i);
        }
        assert_eq!(queue.capacity(), 64);
        for i in 0..64 {
            assert_eq!(queue.pop_front(), Some(i));
        }
    }

    #[test]
    fn grows_while_wrapped() {
        let mut queue = RingQueue::with_capacity(0);
        for i in 0..32 {
            queue.push_back(i);
        }
        for i in 0..32 {
            assert_eq!(queue.pop_front(), Some(i));
        }
        // Head is mid-buffer; fill past capacity to force a relayout.
        for i in 0..100 {
            queue.push_back(i);
        }
        assert_eq!(queue.capacity(), 128);
        for i in 0..100 {
            assert_eq!(queue.pop_front(), Some(i));
        }
    }
}
