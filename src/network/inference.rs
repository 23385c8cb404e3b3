//! Exact inference over discrete factors by variable elimination.

use super::cpd::TabularCpd;

/// A non-negative function over the joint states of some variables.
///
/// Values are stored row-major: the last variable varies fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    vars: Vec<usize>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

impl Factor {
    pub fn new(vars: Vec<usize>, cards: Vec<usize>, values: Vec<f64>) -> Self {
        debug_assert_eq!(vars.len(), cards.len());
        debug_assert_eq!(values.len(), cards.iter().product::<usize>());
        Self {
            vars,
            cards,
            values,
        }
    }

    /// Factor for `P(var | parents)`; `parents` are the variable ids of the
    /// CPD's parents, in CPD order.
    pub fn from_cpd(var: usize, parents: &[usize], cpd: &TabularCpd) -> Self {
        let mut vars = parents.to_vec();
        vars.push(var);
        let mut cards = cpd.parent_cards.clone();
        cards.push(cpd.states.len());
        Self::new(vars, cards, cpd.values.iter().copied().collect())
    }

    pub fn vars(&self) -> &[usize] {
        &self.vars
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn contains(&self, var: usize) -> bool {
        self.vars.contains(&var)
    }

    fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.cards.len()];
        for i in (0..self.cards.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.cards[i + 1];
        }
        strides
    }

    /// Fix `var` to `state` and drop it from the scope.
    pub fn reduce(&self, var: usize, state: usize) -> Factor {
        let Some(pos) = self.vars.iter().position(|&v| v == var) else {
            return self.clone();
        };
        let strides = self.strides();
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);

        let values = (0..self.values.len())
            .filter(|&i| (i / strides[pos]) % self.cards[pos] == state)
            .map(|i| self.values[i])
            .collect();
        Factor::new(vars, cards, values)
    }

    /// Sum `var` out of the factor.
    pub fn marginalize(&self, var: usize) -> Factor {
        let Some(pos) = self.vars.iter().position(|&v| v == var) else {
            return self.clone();
        };
        let strides = self.strides();
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);

        let size: usize = cards.iter().product();
        let mut values = vec![0.0; size];
        for (i, &v) in self.values.iter().enumerate() {
            // Drop the digit at `pos` from the mixed-radix index.
            let high = i / (strides[pos] * self.cards[pos]);
            let low = i % strides[pos];
            values[high * strides[pos] + low] += v;
        }
        Factor::new(vars, cards, values)
    }

    /// Pointwise product over the union of both scopes.
    pub fn product(&self, other: &Factor) -> Factor {
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        for (&v, &c) in other.vars.iter().zip(&other.cards) {
            if !vars.contains(&v) {
                vars.push(v);
                cards.push(c);
            }
        }

        let self_map: Vec<usize> = self
            .vars
            .iter()
            .map(|v| vars.iter().position(|x| x == v).unwrap_or_default())
            .collect();
        let other_map: Vec<usize> = other
            .vars
            .iter()
            .map(|v| vars.iter().position(|x| x == v).unwrap_or_default())
            .collect();
        let self_strides = self.strides();
        let other_strides = other.strides();

        let size: usize = cards.iter().product();
        let mut assignment = vec![0usize; vars.len()];
        let mut values = Vec::with_capacity(size);
        for _ in 0..size {
            let a: usize = self_map
                .iter()
                .zip(&self_strides)
                .map(|(&k, &s)| assignment[k] * s)
                .sum();
            let b: usize = other_map
                .iter()
                .zip(&other_strides)
                .map(|(&k, &s)| assignment[k] * s)
                .sum();
            values.push(self.values[a] * other.values[b]);
            increment(&mut assignment, &cards);
        }
        Factor::new(vars, cards, values)
    }

    /// Scale so the values sum to one. All-zero factors become uniform.
    pub fn normalize(mut self) -> Factor {
        let total: f64 = self.values.iter().sum();
        if total > 0.0 {
            self.values.iter_mut().for_each(|v| *v /= total);
        } else if !self.values.is_empty() {
            let u = 1.0 / self.values.len() as f64;
            self.values.iter_mut().for_each(|v| *v = u);
        }
        self
    }
}

/// Advance a mixed-radix counter, last digit fastest.
fn increment(assignment: &mut [usize], cards: &[usize]) {
    for i in (0..assignment.len()).rev() {
        assignment[i] += 1;
        if assignment[i] < cards[i] {
            return;
        }
        assignment[i] = 0;
    }
}

/// Posterior over `query` after eliminating every variable in `order`.
///
/// `factors` must already be reduced by the evidence. Returns the normalized
/// distribution over the query's states.
pub fn variable_elimination(mut factors: Vec<Factor>, query: usize, order: &[usize]) -> Vec<f64> {
    for &var in order.iter().filter(|&&v| v != query) {
        let (touching, rest): (Vec<Factor>, Vec<Factor>) =
            factors.into_iter().partition(|f| f.contains(var));
        factors = rest;
        if let Some(joint) = touching.into_iter().reduce(|acc, f| acc.product(&f)) {
            factors.push(joint.marginalize(var));
        }
    }

    let joint = factors
        .into_iter()
        .reduce(|acc, f| acc.product(&f))
        .unwrap_or_else(|| Factor::new(Vec::new(), Vec::new(), vec![1.0]));

    // Anything left besides the query is a scalar or was not eliminated.
    let mut joint = joint;
    let leftovers: Vec<usize> = joint.vars.iter().copied().filter(|&v| v != query).collect();
    for var in leftovers {
        joint = joint.marginalize(var);
    }
    joint.normalize().values
}

#[cfg(test)]
mod tests {
    use super::*;

    // a -> b with P(a) = [0.6, 0.4], P(b | a) = [[0.9, 0.1], [0.2, 0.8]]
    fn prior_a() -> Factor {
        Factor::new(vec![0], vec![2], vec![0.6, 0.4])
    }

    fn b_given_a() -> Factor {
        Factor::new(vec![0, 1], vec![2, 2], vec![0.9, 0.1, 0.2, 0.8])
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn reduce_picks_matching_entries() {
        let f = b_given_a().reduce(1, 1);
        assert_eq!(f.vars(), &[0]);
        assert!(close(f.values(), &[0.1, 0.8]));

        let g = b_given_a().reduce(0, 1);
        assert_eq!(g.vars(), &[1]);
        assert!(close(g.values(), &[0.2, 0.8]));
    }

    #[test]
    fn marginalize_sums_out_variable() {
        let joint = prior_a().product(&b_given_a());
        let b = joint.marginalize(0);
        assert_eq!(b.vars(), &[1]);
        assert!(close(b.values(), &[0.62, 0.38]));
    }

    #[test]
    fn posterior_by_bayes_rule() {
        // P(a | b = 1) = (0.6*0.1, 0.4*0.8) / 0.38
        let factors = vec![prior_a(), b_given_a().reduce(1, 1)];
        let post = variable_elimination(factors, 0, &[]);
        assert!(close(&post, &[0.06 / 0.38, 0.32 / 0.38]));
    }

    #[test]
    fn eliminates_hidden_variables() {
        // a -> b -> c, query c with nothing observed.
        let c_given_b = Factor::new(vec![1, 2], vec![2, 2], vec![0.5, 0.5, 0.0, 1.0]);
        let post = variable_elimination(vec![prior_a(), b_given_a(), c_given_b], 2, &[0, 1]);
        // P(b=0) = 0.62 -> P(c=0) = 0.31
        assert!(close(&post, &[0.31, 0.69]));
    }

    #[test]
    fn product_with_disjoint_scopes_is_outer_product() {
        let x = Factor::new(vec![3], vec![2], vec![1.0, 2.0]);
        let y = Factor::new(vec![4], vec![3], vec![1.0, 10.0, 100.0]);
        let xy = x.product(&y);
        assert_eq!(xy.vars(), &[3, 4]);
        assert!(close(xy.values(), &[1.0, 10.0, 100.0, 2.0, 20.0, 200.0]));
    }
}
