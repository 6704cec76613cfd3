use hostres_domain::RequestPriority;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Handle of a queued slot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

type QueueKey = (Reverse<RequestPriority>, u64);

#[derive(Debug)]
pub enum AddOutcome<T> {
    /// A slot was free. The caller owns the slot and must `release` it.
    Granted(T),
    /// Queued behind earlier or higher-priority work. When the queue bound
    /// was exceeded, `evicted` holds the entry pushed out to make room (it
    /// may be the one just added).
    Queued {
        ticket: Ticket,
        evicted: Option<(Ticket, T)>,
    },
}

/// Bounds concurrently running stages and orders waiting ones by priority,
/// then arrival. Running work is never preempted.
#[derive(Debug)]
pub struct PrioritizedDispatcher<T> {
    limit: usize,
    /// 0 = unbounded.
    max_queued: usize,
    running: usize,
    queue: BTreeMap<QueueKey, T>,
    priorities: FxHashMap<Ticket, RequestPriority>,
    next_seq: u64,
}

impl<T> PrioritizedDispatcher<T> {
    pub fn new(limit: usize, max_queued: usize) -> Self {
        Self {
            limit: limit.max(1),
            max_queued,
            running: 0,
            queue: BTreeMap::new(),
            priorities: FxHashMap::default(),
            next_seq: 0,
        }
    }

    pub fn add(&mut self, priority: RequestPriority, item: T) -> AddOutcome<T> {
        if self.running < self.limit && self.queue.is_empty() {
            self.running += 1;
            return AddOutcome::Granted(item);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let ticket = Ticket(seq);
        self.queue.insert((Reverse(priority), seq), item);
        self.priorities.insert(ticket, priority);

        let evicted = if self.max_queued > 0 && self.queue.len() > self.max_queued {
            self.evict_oldest_lowest()
        } else {
            None
        };

        AddOutcome::Queued { ticket, evicted }
    }

    pub fn cancel(&mut self, ticket: Ticket) -> Option<T> {
        let priority = self.priorities.remove(&ticket)?;
        self.queue.remove(&(Reverse(priority), ticket.0))
    }

    /// Moves a queued entry to a new priority, keeping its arrival order.
    pub fn change_priority(&mut self, ticket: Ticket, priority: RequestPriority) -> bool {
        let Some(current) = self.priorities.get_mut(&ticket) else {
            return false;
        };
        if *current == priority {
            return true;
        }
        let Some(item) = self.queue.remove(&(Reverse(*current), ticket.0)) else {
            return false;
        };
        *current = priority;
        self.queue.insert((Reverse(priority), ticket.0), item);
        true
    }

    /// Returns a running slot. Call [`Self::pop_admitted`] afterwards to
    /// hand the freed capacity to queued work.
    pub fn release(&mut self) {
        self.running = self.running.saturating_sub(1);
    }

    /// Admits the head of the queue if a slot is free.
    pub fn pop_admitted(&mut self) -> Option<(Ticket, T)> {
        if self.running >= self.limit {
            return None;
        }
        let ((_, seq), item) = self.queue.pop_first()?;
        let ticket = Ticket(seq);
        self.priorities.remove(&ticket);
        self.running += 1;
        Some((ticket, item))
    }

    /// Changes the bounds. Already running work is never interrupted. Returns
    /// entries evicted by a lower queue bound.
    pub fn set_limits(&mut self, limit: usize, max_queued: usize) -> Vec<(Ticket, T)> {
        self.limit = limit.max(1);
        self.max_queued = max_queued;
        let mut evicted = Vec::new();
        while self.max_queued > 0 && self.queue.len() > self.max_queued {
            match self.evict_oldest_lowest() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        evicted
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn num_running(&self) -> usize {
        self.running
    }

    pub fn num_queued(&self) -> usize {
        self.queue.len()
    }

    pub fn priority_of(&self, ticket: Ticket) -> Option<RequestPriority> {
        self.priorities.get(&ticket).copied()
    }

    fn evict_oldest_lowest(&mut self) -> Option<(Ticket, T)> {
        let (&(Reverse(lowest), _), _) = self.queue.last_key_value()?;
        let key = *self.queue.range((Reverse(lowest), 0)..).next()?.0;
        let item = self.queue.remove(&key)?;
        let ticket = Ticket(key.1);
        self.priorities.remove(&ticket);
        Some((ticket, item))
    }
}
