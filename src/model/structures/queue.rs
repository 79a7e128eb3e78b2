use std::convert::TryFrom;
use strum_macros::EnumIter;

/// Queues whose matches are kept. Everything else is discarded on fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(i32)]
pub enum Queue {
    Draft = 400,
    RankedSoloDuo = 420,
    Blind = 430,
    RankedFlex = 440,
    Swiftplay = 480,
    Quickplay = 490
}

impl Queue {
    pub fn is_solo_duo(self) -> bool {
        self == Queue::RankedSoloDuo
    }
}

impl TryFrom<i32> for Queue {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            400 => Ok(Queue::Draft),
            420 => Ok(Queue::RankedSoloDuo),
            430 => Ok(Queue::Blind),
            440 => Ok(Queue::RankedFlex),
            480 => Ok(Queue::Swiftplay),
            490 => Ok(Queue::Quickplay),
            _ => Err(())
        }
    }
}
