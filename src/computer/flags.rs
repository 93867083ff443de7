use std::cmp::Ordering;

const LESS: u8 = 0b100;
const GREATER: u8 = 0b010;
const EQUAL: u8 = 0b001;

/// Comparison flags, packed as `00000LGE`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    pub fn from_ordering(ordering: Ordering) -> Flags {
        Flags(match ordering {
            Ordering::Less => LESS,
            Ordering::Greater => GREATER,
            Ordering::Equal => EQUAL,
        })
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn less(self) -> bool {
        self.0 & LESS != 0
    }

    pub fn greater(self) -> bool {
        self.0 & GREATER != 0
    }

    pub fn equal(self) -> bool {
        self.0 & EQUAL != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear() {
        let flags = Flags::default();
        assert_eq!(flags.bits(), 0);
        assert!(!flags.less() && !flags.greater() && !flags.equal());
    }

    #[test]
    fn orderings_set_exactly_one_bit() {
        assert_eq!(Flags::from_ordering(Ordering::Less).bits(), 0b100);
        assert_eq!(Flags::from_ordering(Ordering::Greater).bits(), 0b010);
        assert_eq!(Flags::from_ordering(Ordering::Equal).bits(), 0b001);

        for ordering in [Ordering::Less, Ordering::Greater, Ordering::Equal] {
            assert_eq!(Flags::from_ordering(ordering).bits().count_ones(), 1);
        }
    }
}
