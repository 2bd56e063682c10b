/// argmax returns the index of the maximum value in the array x.
pub fn argmax<T: std::cmp::PartialOrd + std::marker::Copy>(x: &[T]) -> usize {
    let mut idx_max = 0;
    let mut val_max = x[0];

    for (i, &val) in x.iter().enumerate().skip(1) {
        if val > val_max {
            val_max = val;
            idx_max = i;
        }
    }

    idx_max
}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. The underlying sort
/// is stable, so equal values keep their original relative order.
pub fn argsort<T: std::cmp::PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => indices.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap()),
        SortOrder::Descending => indices.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap()),
    }
    indices
}

/// normalize_angle_deg maps an angle difference in degrees into (-180.0, 180.0].
pub fn normalize_angle_deg(mut angle: f64) -> f64 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argsort_is_stable_for_equal_values() {
        let x = [3.0, 1.0, 3.0, 0.5];
        assert_eq!(argsort(&x, SortOrder::Ascending), vec![3, 1, 0, 2]);
    }

    #[test]
    fn argmax_returns_first_maximum() {
        assert_eq!(argmax(&[1.0, 5.0, 5.0, 2.0]), 1);
    }

    #[test]
    fn normalize_angle_wraps_into_half_open_interval() {
        assert_eq!(normalize_angle_deg(270.0), -90.0);
        assert_eq!(normalize_angle_deg(-270.0), 90.0);
        assert_eq!(normalize_angle_deg(180.0), 180.0);
        assert_eq!(normalize_angle_deg(-180.0), 180.0);
    }
}
