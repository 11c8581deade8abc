use crate::geometric::grid::Grid;

/// `(longitude, latitude)` of every tile centre, in grid order.
///
/// These are the coordinates the aWhere API expects for point requests.
pub fn extract_centroids(grid: &Grid) -> Vec<(f64, f64)> {
    grid.iter()
        .map(|tile| {
            let centroid = tile.centroid();
            (centroid.x(), centroid.y())
        })
        .collect()
}
