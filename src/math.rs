
//! Simple math utilities, mostly for sampling grids.

/// Simple two-dimensional vector of any numerical type.
/// Supports only few mathematical operations
/// as this is used mainly as data struct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vec2<T> (pub T, pub T);

impl<T> Vec2<T> {

    /// Seeing this vector as a dimension or size (width and height),
    /// this returns the area that this dimensions contains (`width * height`).
    #[inline] pub fn area(self) -> T where T: std::ops::Mul<T, Output = T> {
        self.0 * self.1
    }

    /// The first component of this 2D vector.
    #[inline] pub fn x(self) -> T { self.0 }

    /// The second component of this 2D vector.
    #[inline] pub fn y(self) -> T { self.1 }

    /// The first component of this 2D vector.
    #[inline] pub fn width(self) -> T { self.0 }

    /// The second component of this 2D vector.
    #[inline] pub fn height(self) -> T { self.1 }
}


impl<T: std::ops::Add<T>> std::ops::Add<Vec2<T>> for Vec2<T> {
    type Output = Vec2<T::Output>;
    fn add(self, other: Vec2<T>) -> Self::Output {
        Vec2(self.0 + other.0, self.1 + other.1)
    }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self { Vec2(x, y) }
}


/// Computes `floor(log(x)/log(2))`. Returns 0 where argument is 0.
pub(crate) fn floor_log_2(mut number: u32) -> u32 {
    let mut log = 0;

    while number > 1 {
        log += 1;
        number >>= 1;
    }

    log
}


/// Division that rounds up, without overflowing near the maximum.
pub(crate) fn ceil_div(dividend: usize, divisor: usize) -> usize {
    dividend / divisor + usize::from(dividend % divisor != 0)
}


/// Division that rounds towards negative infinity,
/// as used for sampling grid calculations.
pub(crate) fn div_p (x: i32, y: i32) -> i32 {
    if x >= 0 {
        if y >= 0 { x  / y }
        else { -(x  / -y) }
    }
    else {
        if y >= 0 { -((y-1-x) / y) }
        else { (-y-1-x) / -y }
    }
}

/// Remainder that is never negative for positive divisors.
pub(crate) fn mod_p(x: i32, y: i32) -> i32 {
    x - y * div_p(x, y)
}

/// How many integers in `start .. start + length` are a multiple of `sampling`.
/// This is the number of samples a sub-sampled channel has within a section of pixels.
pub(crate) fn sample_count(start: i32, length: usize, sampling: usize) -> usize {
    if length == 0 { return 0; }

    let sampling = i32::try_from(sampling).expect("sampling rate too large");
    let end = start + i32::try_from(length).expect("section length too large");
    let count = div_p(end - 1, sampling) - div_p(start - 1, sampling);

    debug_assert!(count >= 0, "negative sample count");
    count as usize
}

/// Least common multiple, or `None` on overflow.
pub(crate) fn least_common_multiple(a: usize, b: usize) -> Option<usize> {
    fn greatest_common_divisor(mut a: usize, mut b: usize) -> usize {
        while b != 0 {
            let remainder = a % b;
            a = b;
            b = remainder;
        }

        a
    }

    if a == 0 || b == 0 { return Some(0); }
    (a / greatest_common_divisor(a, b)).checked_mul(b)
}
