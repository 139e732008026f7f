// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::TransmissionError;
use crate::{
    context::SolverContext,
    error::StructuralError,
    greens_functions::{BlockPartition, BlockView, GreensMode, GreensSolver},
    self_energy::{ChainSettings, ChainSolver, ChainType, Convergence, LeadSide},
    utilities::{broadening, InversionSettings},
};
use nalgebra::DMatrix;
use num_complex::Complex;
use serde::Deserialize;
use std::collections::{hash_map::Entry, HashMap};

/// A semi-infinite lead and its coupling to the device.
///
/// All matrices are blocks of the inverse Green's function. `coupling` runs from one lead
/// cell to the next, left to right. For the left lead `device_coupling` is the
/// `first block x lead cell` block, for the right lead the `lead cell x last block` block.
#[derive(Copy, Clone, Debug)]
pub struct Lead<'a> {
    /// The inverse Green's function of an isolated lead cell
    pub onsite: &'a DMatrix<Complex<f64>>,
    /// Cell to next cell coupling
    pub coupling: &'a DMatrix<Complex<f64>>,
    /// Coupling between the device corner block and the lead surface cell
    pub device_coupling: &'a DMatrix<Complex<f64>>,
}

/// Which device corner the transmission is evaluated on
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransportDirection {
    /// Sweep towards the first block, folding the right lead onto it
    LeftToRight,
    /// Sweep towards the last block, folding the left lead onto it
    RightToLeft,
}

#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq)]
/// Policy for the transport calculation
pub struct TransportSettings {
    /// Proceed with best-effort lead surface Green's functions when a decimation exhausts
    /// its iterations, rather than failing
    #[serde(default)]
    pub allow_unconverged_leads: bool,
}

/// The result of a transport calculation
#[derive(Clone, Debug)]
pub struct TransportSolution {
    /// The Landauer transmission coefficient
    pub transmission: f64,
    /// The full Caroli trace, whose imaginary part vanishes for physical inputs
    pub trace: Complex<f64>,
    /// The device Green's function on the corner block the sweep terminated at
    pub greens_function: DMatrix<Complex<f64>>,
    /// Termination of the left lead decimation
    pub left_lead: Convergence,
    /// Termination of the right lead decimation
    pub right_lead: Convergence,
}

#[derive(Clone, Debug)]
struct LeadSelfEnergies {
    left: DMatrix<Complex<f64>>,
    right: DMatrix<Complex<f64>>,
    left_convergence: Convergence,
    right_convergence: Convergence,
}

/// Builder for a [`TwoLeadTransportSolver`]
pub struct TwoLeadTransportSolverBuilder<RefDevice, RefLeft, RefRight> {
    device: RefDevice,
    left: RefLeft,
    right: RefRight,
    chain: ChainSettings,
    inversion: InversionSettings,
    transport: TransportSettings,
}

impl TwoLeadTransportSolverBuilder<(), (), ()> {
    /// An empty builder
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            device: (),
            left: (),
            right: (),
            chain: ChainSettings::default(),
            inversion: InversionSettings::default(),
            transport: TransportSettings::default(),
        }
    }
}

impl<RefDevice, RefLeft, RefRight> TwoLeadTransportSolverBuilder<RefDevice, RefLeft, RefRight> {
    /// Attach the device inverse Green's function and its block partition
    pub fn with_device<'a>(
        self,
        matrix: &'a DMatrix<Complex<f64>>,
        partition: &'a BlockPartition,
    ) -> TwoLeadTransportSolverBuilder<
        (&'a DMatrix<Complex<f64>>, &'a BlockPartition),
        RefLeft,
        RefRight,
    > {
        TwoLeadTransportSolverBuilder {
            device: (matrix, partition),
            left: self.left,
            right: self.right,
            chain: self.chain,
            inversion: self.inversion,
            transport: self.transport,
        }
    }

    /// Attach the lead on the first device block
    pub fn with_left_lead(
        self,
        lead: Lead<'_>,
    ) -> TwoLeadTransportSolverBuilder<RefDevice, Lead<'_>, RefRight> {
        TwoLeadTransportSolverBuilder {
            device: self.device,
            left: lead,
            right: self.right,
            chain: self.chain,
            inversion: self.inversion,
            transport: self.transport,
        }
    }

    /// Attach the lead on the last device block
    pub fn with_right_lead(
        self,
        lead: Lead<'_>,
    ) -> TwoLeadTransportSolverBuilder<RefDevice, RefLeft, Lead<'_>> {
        TwoLeadTransportSolverBuilder {
            device: self.device,
            left: self.left,
            right: lead,
            chain: self.chain,
            inversion: self.inversion,
            transport: self.transport,
        }
    }

    /// Replace the decimation budget used for both leads
    pub fn with_chain_settings(mut self, chain: ChainSettings) -> Self {
        self.chain = chain;
        self
    }

    /// Replace the singularity criterion
    pub fn with_inversion_settings(mut self, inversion: InversionSettings) -> Self {
        self.inversion = inversion;
        self
    }

    /// Replace the transport policy
    pub fn with_transport_settings(mut self, transport: TransportSettings) -> Self {
        self.transport = transport;
        self
    }
}

impl<'a>
    TwoLeadTransportSolverBuilder<
        (&'a DMatrix<Complex<f64>>, &'a BlockPartition),
        Lead<'a>,
        Lead<'a>,
    >
{
    /// Validates every shape and builds the solver
    pub fn build(self) -> Result<TwoLeadTransportSolver<'a>, TransmissionError> {
        let (device, partition) = self.device;
        let (rows, columns) = device.shape();
        if rows != columns {
            return Err(StructuralError::NonSquare { rows, columns }.into());
        }
        let view = BlockView::new(device, partition)?;
        if !view.is_block_square() {
            return Err(StructuralError::MalformedRequest(
                "the device partition must have matching row and column blocks".into(),
            )
            .into());
        }

        for (side, lead) in [(LeadSide::Left, &self.left), (LeadSide::Right, &self.right)] {
            let (rows, columns) = lead.onsite.shape();
            if rows != columns {
                return Err(StructuralError::NonSquare { rows, columns }.into());
            }
            if lead.coupling.shape() != lead.onsite.shape() {
                return Err(StructuralError::DimensionMismatch {
                    context: "lead cell coupling",
                    expected: lead.onsite.shape(),
                    found: lead.coupling.shape(),
                }
                .into());
            }
            let expected = match side {
                LeadSide::Left => (partition.size_of(0), rows),
                LeadSide::Right => (rows, partition.size_of(partition.number_of_blocks() - 1)),
            };
            if lead.device_coupling.shape() != expected {
                return Err(StructuralError::DimensionMismatch {
                    context: "device to lead coupling",
                    expected,
                    found: lead.device_coupling.shape(),
                }
                .into());
            }
        }

        Ok(TwoLeadTransportSolver {
            device,
            partition,
            left: self.left,
            right: self.right,
            chain: self.chain,
            inversion: self.inversion,
            transport: self.transport,
            context: SolverContext::default(),
            self_energies: None,
            cache: HashMap::new(),
            evaluations: 0,
        })
    }
}

/// Landauer transmission through a device between two semi-infinite leads.
///
/// Lead self energies are computed once and shared by both directions. Each direction is
/// memoised.
pub struct TwoLeadTransportSolver<'a> {
    device: &'a DMatrix<Complex<f64>>,
    partition: &'a BlockPartition,
    left: Lead<'a>,
    right: Lead<'a>,
    chain: ChainSettings,
    inversion: InversionSettings,
    transport: TransportSettings,
    context: SolverContext<'a>,
    self_energies: Option<LeadSelfEnergies>,
    cache: HashMap<TransportDirection, TransportSolution>,
    evaluations: usize,
}

impl<'a> TwoLeadTransportSolver<'a> {
    /// Attach the logging and progress context
    pub fn with_context(mut self, context: SolverContext<'a>) -> Self {
        self.context = context;
        self
    }

    /// The transport solution evaluated on the corner selected by `direction`
    pub fn compute(
        &mut self,
        direction: TransportDirection,
    ) -> Result<&TransportSolution, TransmissionError> {
        let self_energies: &LeadSelfEnergies = match &mut self.self_energies {
            Some(self_energies) => self_energies,
            slot => slot.insert(lead_self_energies(
                &self.left,
                &self.right,
                &self.chain,
                &self.inversion,
                &self.transport,
                self.context,
            )?),
        };

        let solution = match self.cache.entry(direction) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let solution = solve(
                    self.device,
                    self.partition,
                    self_energies,
                    direction,
                    &self.inversion,
                    self.context,
                )?;
                self.evaluations += 1;
                entry.insert(solution)
            }
        };
        Ok(solution)
    }

    /// Shorthand for the transmission coefficient of `compute`
    pub fn transmission(&mut self, direction: TransportDirection) -> Result<f64, TransmissionError> {
        self.compute(direction).map(|solution| solution.transmission)
    }

    /// The number of directions actually solved rather than read from the cache
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

fn lead_self_energies(
    left: &Lead<'_>,
    right: &Lead<'_>,
    chain: &ChainSettings,
    inversion: &InversionSettings,
    transport: &TransportSettings,
    context: SolverContext<'_>,
) -> Result<LeadSelfEnergies, TransmissionError> {
    let fold = |lead: &Lead<'_>, side: LeadSide, chain_type: ChainType| {
        ChainSolver::new(lead.onsite, lead.coupling)
            .map(|solver| {
                solver
                    .with_settings(*chain)
                    .with_inversion_settings(*inversion)
                    .with_context(context)
            })
            .and_then(|mut solver| solver.self_energy(chain_type, lead.device_coupling))
            .map_err(|source| TransmissionError::Lead { side, source })
    };
    let (left_self_energy, left_convergence) =
        fold(left, LeadSide::Left, ChainType::LeftSemiInfinite)?;
    let (right_self_energy, right_convergence) =
        fold(right, LeadSide::Right, ChainType::RightSemiInfinite)?;

    for (side, convergence) in [
        (LeadSide::Left, left_convergence),
        (LeadSide::Right, right_convergence),
    ] {
        if let Err(source) = convergence.ensure_converged() {
            if !transport.allow_unconverged_leads {
                return Err(TransmissionError::UnconvergedLead { side, source });
            }
            if context.logging_enabled() {
                tracing::warn!("Continuing with an unconverged {:?} lead: {}", side, source);
            }
        }
    }

    Ok(LeadSelfEnergies {
        left: left_self_energy,
        right: right_self_energy,
        left_convergence,
        right_convergence,
    })
}

fn solve(
    device: &DMatrix<Complex<f64>>,
    partition: &BlockPartition,
    self_energies: &LeadSelfEnergies,
    direction: TransportDirection,
    inversion: &InversionSettings,
    context: SolverContext<'_>,
) -> Result<TransportSolution, TransmissionError> {
    let last = partition.number_of_blocks() - 1;
    let mut dressed = device.clone();
    {
        let (offset, size) = (partition.offset_of(0), partition.size_of(0));
        let mut block = dressed.slice_mut((offset, offset), (size, size));
        block -= &self_energies.left;
    }
    {
        let (offset, size) = (partition.offset_of(last), partition.size_of(last));
        let mut block = dressed.slice_mut((offset, offset), (size, size));
        block -= &self_energies.right;
    }

    let mode = match direction {
        TransportDirection::LeftToRight => GreensMode::FirstBlock,
        TransportDirection::RightToLeft => GreensMode::LastBlock,
    };
    let mut solver = GreensSolver::new(&dressed, partition)?
        .with_settings(*inversion)
        .with_context(context);
    let greens_function = solver.compute(mode)?.clone();

    // A single block has no sweep, the far lead then acts on the block directly
    let (near, far) = match direction {
        TransportDirection::LeftToRight => (
            &self_energies.left,
            solver.reduced_sigma().unwrap_or(&self_energies.right),
        ),
        TransportDirection::RightToLeft => (
            &self_energies.right,
            solver.reduced_sigma().unwrap_or(&self_energies.left),
        ),
    };
    let gamma_near = broadening(near);
    let gamma_far = broadening(far);
    let trace = (&gamma_far * &greens_function * &gamma_near * greens_function.adjoint()).trace();

    if context.logging_enabled() {
        tracing::debug!(
            "{:?} transmission {:.6e} (imaginary residual {:.2e})",
            direction,
            trace.re,
            trace.im
        );
    }

    Ok(TransportSolution {
        transmission: trace.re,
        trace,
        greens_function,
        left_lead: self_energies.left_convergence,
        right_lead: self_energies.right_convergence,
    })
}

#[cfg(test)]
mod test {
    use super::{Lead, TransportDirection, TransportSettings, TwoLeadTransportSolverBuilder};
    use crate::greens_functions::BlockPartition;
    use crate::self_energy::ChainSettings;
    use crate::utilities::{broadening, retarded_inverse};
    use crate::ErrorCategory;
    use nalgebra::DMatrix;
    use num_complex::Complex;
    use rand::{rngs::StdRng, SeedableRng};

    struct LinearChain {
        device: DMatrix<Complex<f64>>,
        partition: BlockPartition,
        onsite: DMatrix<Complex<f64>>,
        hopping: DMatrix<Complex<f64>>,
    }

    // Nearest neighbour chain with unit hopping, `sites` of them in the device
    fn linear_chain(energy: f64, sites: usize) -> LinearChain {
        let mut hamiltonian = DMatrix::<Complex<f64>>::zeros(sites, sites);
        for site in 0..sites - 1 {
            hamiltonian[(site, site + 1)] = Complex::from(-1.);
            hamiltonian[(site + 1, site)] = Complex::from(-1.);
        }
        LinearChain {
            device: retarded_inverse(&hamiltonian, energy, 1e-10),
            partition: BlockPartition::uniform(1, sites).unwrap(),
            onsite: DMatrix::from_element(1, 1, Complex::new(energy, 1e-6)),
            hopping: DMatrix::from_element(1, 1, Complex::from(1.)),
        }
    }

    #[test]
    fn a_perfect_chain_transmits_one_channel_inside_the_band() {
        let chain = linear_chain(0.5, 4);
        let lead = Lead {
            onsite: &chain.onsite,
            coupling: &chain.hopping,
            device_coupling: &chain.hopping,
        };
        let mut solver = TwoLeadTransportSolverBuilder::new()
            .with_device(&chain.device, &chain.partition)
            .with_left_lead(lead)
            .with_right_lead(lead)
            .build()
            .unwrap();

        for direction in [TransportDirection::LeftToRight, TransportDirection::RightToLeft] {
            let solution = solver.compute(direction).unwrap();
            approx::assert_relative_eq!(solution.transmission, 1., epsilon = 1e-4);
            approx::assert_relative_eq!(solution.trace.im, 0., epsilon = 1e-8);
        }
    }

    #[test]
    fn a_perfect_chain_is_opaque_outside_the_band() {
        let chain = linear_chain(2.5, 3);
        let lead = Lead {
            onsite: &chain.onsite,
            coupling: &chain.hopping,
            device_coupling: &chain.hopping,
        };
        let mut solver = TwoLeadTransportSolverBuilder::new()
            .with_device(&chain.device, &chain.partition)
            .with_left_lead(lead)
            .with_right_lead(lead)
            .build()
            .unwrap();
        let transmission = solver.transmission(TransportDirection::LeftToRight).unwrap();
        approx::assert_relative_eq!(transmission, 0., epsilon = 1e-4);
    }

    #[test]
    fn both_directions_agree_with_the_dense_caroli_formula() {
        let mut rng = StdRng::seed_from_u64(31);
        let energy = 0.1;
        let sizes = [2, 3, 2];
        let hamiltonian = utilities::random_block_tridiagonal(&sizes, &mut rng);
        let device = retarded_inverse(&hamiltonian, energy, 1e-10);
        let partition = BlockPartition::new(&sizes, 7).unwrap();

        let onsite = retarded_inverse(&utilities::random_hermitian(2, &mut rng), energy, 1e-4);
        let coupling = utilities::random_hermitian(2, &mut rng) * Complex::from(0.8);
        let left_coupling = utilities::random_matrix(2, 2, &mut rng);
        let right_coupling = utilities::random_matrix(2, 2, &mut rng);
        let left = Lead {
            onsite: &onsite,
            coupling: &coupling,
            device_coupling: &left_coupling,
        };
        let right = Lead {
            onsite: &onsite,
            coupling: &coupling,
            device_coupling: &right_coupling,
        };
        let mut solver = TwoLeadTransportSolverBuilder::new()
            .with_device(&device, &partition)
            .with_left_lead(left)
            .with_right_lead(right)
            .build()
            .unwrap();

        let left_to_right = solver.transmission(TransportDirection::LeftToRight).unwrap();
        let right_to_left = solver.transmission(TransportDirection::RightToLeft).unwrap();
        assert!(left_to_right >= -1e-12);
        approx::assert_relative_eq!(left_to_right, right_to_left, epsilon = 1e-6);

        // Dense reference, Tr(Γ_L G_{0 N-1} Γ_R G_{0 N-1}†)
        let mut chain = crate::self_energy::ChainSolver::new(&onsite, &coupling).unwrap();
        let (sigma_left, _) = chain
            .self_energy(crate::self_energy::ChainType::LeftSemiInfinite, &left_coupling)
            .unwrap();
        let (sigma_right, _) = chain
            .self_energy(crate::self_energy::ChainType::RightSemiInfinite, &right_coupling)
            .unwrap();
        let mut dressed = device.clone();
        let mut first = dressed.slice_mut((0, 0), (2, 2));
        first -= &sigma_left;
        let mut last = dressed.slice_mut((5, 5), (2, 2));
        last -= &sigma_right;
        let inverse = dressed.try_inverse().unwrap();
        let corner = inverse.slice((0, 5), (2, 2)).into_owned();
        let caroli = (broadening(&sigma_left) * &corner * broadening(&sigma_right) * corner.adjoint())
            .trace();
        approx::assert_relative_eq!(left_to_right, caroli.re, epsilon = 1e-6);
    }

    #[test]
    fn unconverged_leads_fail_unless_explicitly_allowed() {
        let chain = linear_chain(0.5, 3);
        let lead = Lead {
            onsite: &chain.onsite,
            coupling: &chain.hopping,
            device_coupling: &chain.hopping,
        };
        let budget = ChainSettings {
            maximum_iterations: 2,
            tolerance: 1e-10,
        };
        let mut strict = TwoLeadTransportSolverBuilder::new()
            .with_device(&chain.device, &chain.partition)
            .with_left_lead(lead)
            .with_right_lead(lead)
            .with_chain_settings(budget)
            .build()
            .unwrap();
        let error = strict
            .compute(TransportDirection::LeftToRight)
            .unwrap_err();
        assert_eq!(error.category(), ErrorCategory::NonConvergence);

        let mut lenient = TwoLeadTransportSolverBuilder::new()
            .with_device(&chain.device, &chain.partition)
            .with_left_lead(lead)
            .with_right_lead(lead)
            .with_chain_settings(budget)
            .with_transport_settings(TransportSettings {
                allow_unconverged_leads: true,
            })
            .build()
            .unwrap();
        let solution = lenient.compute(TransportDirection::LeftToRight).unwrap();
        assert!(!solution.left_lead.is_converged());
    }

    #[test]
    fn repeated_requests_reuse_the_cached_solution() {
        let chain = linear_chain(0.3, 3);
        let lead = Lead {
            onsite: &chain.onsite,
            coupling: &chain.hopping,
            device_coupling: &chain.hopping,
        };
        let mut solver = TwoLeadTransportSolverBuilder::new()
            .with_device(&chain.device, &chain.partition)
            .with_left_lead(lead)
            .with_right_lead(lead)
            .build()
            .unwrap();
        let first = solver.transmission(TransportDirection::LeftToRight).unwrap();
        let second = solver.transmission(TransportDirection::LeftToRight).unwrap();
        assert_eq!(first, second);
        assert_eq!(solver.evaluations(), 1);
    }

    #[test]
    fn single_block_devices_use_the_far_lead_directly() {
        let chain = linear_chain(-0.7, 3);
        let partition = BlockPartition::single(3);
        let coupling = DMatrix::from_fn(3, 1, |i, _| Complex::from(if i == 0 { 1. } else { 0. }));
        let right_coupling =
            DMatrix::from_fn(1, 3, |_, j| Complex::from(if j == 2 { 1. } else { 0. }));
        let left = Lead {
            onsite: &chain.onsite,
            coupling: &chain.hopping,
            device_coupling: &coupling,
        };
        let right = Lead {
            onsite: &chain.onsite,
            coupling: &chain.hopping,
            device_coupling: &right_coupling,
        };
        let mut solver = TwoLeadTransportSolverBuilder::new()
            .with_device(&chain.device, &partition)
            .with_left_lead(left)
            .with_right_lead(right)
            .build()
            .unwrap();
        let transmission = solver.transmission(TransportDirection::LeftToRight).unwrap();
        approx::assert_relative_eq!(transmission, 1., epsilon = 1e-4);
    }

    #[test]
    fn misshapen_device_couplings_are_rejected_before_any_work() {
        let chain = linear_chain(0.5, 3);
        let wrong = DMatrix::<Complex<f64>>::zeros(2, 1);
        let lead = Lead {
            onsite: &chain.onsite,
            coupling: &chain.hopping,
            device_coupling: &chain.hopping,
        };
        let result = TwoLeadTransportSolverBuilder::new()
            .with_device(&chain.device, &chain.partition)
            .with_left_lead(Lead {
                device_coupling: &wrong,
                ..lead
            })
            .with_right_lead(lead)
            .build();
        assert_eq!(
            result.err().map(|error| error.category()),
            Some(ErrorCategory::Structural)
        );
    }
}
