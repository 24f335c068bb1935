//! Primality oracle
//!
//! The scan layers treat primality as an opaque predicate. Anything with the
//! [`PrimalityTest`] signature can be plugged into a unit run.

/// Signature of a primality predicate used by fine workers
pub type PrimalityTest = fn(i64) -> bool;

/// Trial division up to `sqrt(n)`
///
/// Values below 2 are not prime.
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut d = 3;
    // d <= n / d avoids overflowing d * d near i64::MAX
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values() {
        assert!(!is_prime(-7));
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(2));
        assert!(is_prime(3));
        assert!(!is_prime(4));
        assert!(is_prime(5));
        assert!(!is_prime(9));
        assert!(!is_prime(24));
    }

    #[test]
    fn test_primes_below_fifty() {
        let found: Vec<i64> = (0..50).filter(|&n| is_prime(n)).collect();
        assert_eq!(
            found,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]
        );
    }

    #[test]
    fn test_squares_of_primes() {
        assert!(!is_prime(49));
        assert!(!is_prime(121));
        assert!(!is_prime(7919 * 7919));
    }

    #[test]
    fn test_large_values() {
        assert!(is_prime(2_147_483_647));
        assert!(!is_prime(i64::MAX));
    }
}
