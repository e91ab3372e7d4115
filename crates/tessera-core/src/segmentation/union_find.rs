/// Disjoint-set forest with union by rank and full path compression.
///
/// Set ids are dense indices handed out by [`UnionFind::make_set`]. There is
/// no removal; a forest lives for a single labeling pass.
#[derive(Clone, Debug, Default)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forest of `len` singleton sets `0..len`.
    pub fn with_len(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Append a new singleton set and return its id.
    pub fn make_set(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        id
    }

    /// Root of `x`'s set. Every node on the walked path is repointed
    /// directly at the root.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Union the sets containing `x` and `y`.
    ///
    /// The lower-rank root goes under the higher one. On equal rank `x`'s
    /// root becomes the parent and its rank grows by one.
    pub fn link(&mut self, x: usize, y: usize) {
        let xr = self.find(x);
        let yr = self.find(y);
        if xr == yr {
            return;
        }

        let (xd, yd) = (self.rank[xr], self.rank[yr]);
        if xd < yd {
            self.parent[xr] = yr;
        } else if yd < xd {
            self.parent[yr] = xr;
        } else {
            self.parent[yr] = xr;
            self.rank[xr] += 1;
        }
    }
}
